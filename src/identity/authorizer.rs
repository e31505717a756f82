//! Role and permission checks for the signed-in user.
//!
//! `admin` short-circuits every check. Everything else compares the user's highest
//! hierarchy role against the minimum role the [`PermissionTable`] lists for a
//! resource/action pair; pairs missing from the table require `admin`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::principal::UserInfo;
use super::role::Role;
use super::session::AuthState;

/// `resource -> action -> minimum role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable(BTreeMap<String, BTreeMap<String, Role>>);

impl Default for PermissionTable {
    fn default() -> Self {
        let mut t = PermissionTable::empty();
        t.set_resource("master_data", &[("read", Role::User), ("create", Role::Officer), ("update", Role::Supervisor), ("delete", Role::Admin)]);
        t.set_resource("kepegawaian", &[("read", Role::User), ("create", Role::Staff), ("update", Role::Officer), ("delete", Role::Supervisor)]);
        t.set_resource("rbac", &[("read", Role::Admin), ("create", Role::Admin), ("update", Role::Admin), ("delete", Role::Admin)]);
        t.set_resource("audit", &[("read", Role::Admin), ("delete", Role::Admin)]);
        t
    }
}

impl PermissionTable {
    pub fn empty() -> Self { Self(BTreeMap::new()) }

    pub fn set(&mut self, resource: &str, action: &str, min: Role) {
        self.0.entry(resource.to_string()).or_default().insert(action.to_string(), min);
    }

    pub fn set_resource(&mut self, resource: &str, actions: &[(&str, Role)]) {
        for (action, min) in actions { self.set(resource, action, *min); }
    }

    /// Minimum role for `resource`/`action`, `Admin` when either is unknown.
    pub fn required(&self, resource: &str, action: &str) -> Role {
        self.0.get(resource).and_then(|a| a.get(action)).copied().unwrap_or(Role::Admin)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("invalid permission table json")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading permission table {}", path.display()))?;
        Self::from_json_str(&text)
    }
}

/// Permission view over an optional user. `None` means nobody is signed in and every
/// check except the vacuous ones fails.
#[derive(Debug, Clone, Copy)]
pub struct Permissions<'a> {
    user: Option<&'a UserInfo>,
    table: Option<&'a PermissionTable>,
}

static DEFAULT_TABLE: once_cell::sync::Lazy<PermissionTable> = once_cell::sync::Lazy::new(PermissionTable::default);

impl<'a> Permissions<'a> {
    pub fn new(user: Option<&'a UserInfo>) -> Self { Self { user, table: None } }

    pub fn with_table(mut self, table: &'a PermissionTable) -> Self { self.table = Some(table); self }

    fn table(&self) -> &PermissionTable { self.table.unwrap_or_else(|| &*DEFAULT_TABLE) }

    pub fn user(&self) -> Option<&'a UserInfo> { self.user }

    pub fn is_authenticated(&self) -> bool { self.user.is_some() }

    pub fn is_admin(&self) -> bool { self.user.map(UserInfo::is_admin).unwrap_or(false) }

    pub fn authority(&self) -> Option<Role> { self.user.and_then(UserInfo::authority) }

    fn holds(&self, role: &str) -> bool { self.user.map(|u| u.roles.contains(role)).unwrap_or(false) }

    pub fn has_role(&self, role: &str) -> bool { self.is_admin() || self.holds(role) }

    /// Empty `roles` is false for non-admins.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        if self.is_admin() { return true; }
        roles.iter().any(|r| self.holds(r.as_ref()))
    }

    /// Empty `roles` is true, signed in or not.
    pub fn has_all_roles<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        if self.is_admin() { return true; }
        roles.iter().all(|r| self.holds(r.as_ref()))
    }

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        if self.is_admin() { return true; }
        let required = self.table().required(resource, action);
        let allowed = self.authority().map(|have| have >= required).unwrap_or(false);
        tracing::trace!(target: "sikerma::auth", resource, action, %required, allowed, "permission check");
        allowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequireMode {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session check still running; render a placeholder.
    Loading,
    Granted,
    Denied,
}

/// Gate a piece of UI on the session's roles. An empty `roles` list only requires that the
/// session has finished loading.
pub fn guard<S: AsRef<str>>(state: &AuthState, roles: &[S], mode: RequireMode) -> GuardOutcome {
    if state.is_loading { return GuardOutcome::Loading; }
    let perms = Permissions::new(state.user.as_ref());
    if perms.is_admin() || roles.is_empty() { return GuardOutcome::Granted; }
    let ok = match mode {
        RequireMode::Any => perms.has_any_role(roles),
        RequireMode::All => perms.has_all_roles(roles),
    };
    if ok { GuardOutcome::Granted } else { GuardOutcome::Denied }
}
