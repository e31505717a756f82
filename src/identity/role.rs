use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Realm roles that carry authority in the portal, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    Officer,
    Staff,
    User,
}

pub const ADMIN_ROLE: &str = "admin";

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Supervisor, Role::Officer, Role::Staff, Role::User];

    /// Numeric authority used by the backend's RBAC catalogue.
    pub fn level(self) -> u8 {
        match self {
            Role::Admin => 100,
            Role::Supervisor => 80,
            Role::Officer => 60,
            Role::Staff => 40,
            Role::User => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ADMIN_ROLE,
            Role::Supervisor => "supervisor",
            Role::Officer => "officer",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }

    /// Highest role named in `roles`; strings outside the hierarchy are skipped,
    /// so a set with no hierarchy role yields `None`.
    pub fn highest<'a, I>(roles: I) -> Option<Role>
    where
        I: IntoIterator<Item = &'a str>,
    {
        roles.into_iter().filter_map(|r| r.parse::<Role>().ok()).max()
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering { self.level().cmp(&other.level()) }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;
    // realm role names are lower-case in Keycloak; match exactly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL.iter().copied().find(|r| r.as_str() == s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}
