//! Identity, roles and the authentication session.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod error;
mod principal;
mod provider;
mod role;
mod session;

pub use authorizer::{guard, GuardOutcome, PermissionTable, Permissions, RequireMode};
pub use error::AuthError;
pub use principal::{decode_claims, RealmAccess, TokenClaims, UserInfo};
pub use provider::{IdentityClient, IdentitySession, KeycloakClient, KeycloakConfig, REFRESH_LEEWAY_SECS};
pub use role::{Role, UnknownRole, ADMIN_ROLE};
pub use session::{AuthState, SessionStore};

/// Role checks straight off an [`AuthState`]; all false when nobody is signed in.
pub fn has_role(state: &AuthState, role: &str) -> bool { state.user.is_some() && Permissions::new(state.user.as_ref()).has_role(role) }

pub fn has_any_role<S: AsRef<str>>(state: &AuthState, roles: &[S]) -> bool {
    state.user.is_some() && Permissions::new(state.user.as_ref()).has_any_role(roles)
}

pub fn has_all_roles<S: AsRef<str>>(state: &AuthState, roles: &[S]) -> bool {
    state.user.is_some() && Permissions::new(state.user.as_ref()).has_all_roles(roles)
}

#[cfg(test)]
pub(crate) use principal::encode_test_token;
