use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::tprintln;

use super::authorizer::Permissions;
use super::error::AuthError;
use super::principal::UserInfo;
use super::provider::{IdentityClient, IdentitySession};

/// Snapshot of the portal's authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserInfo>,
    pub token: Option<String>,
    pub is_loading: bool,
}

impl Default for AuthState {
    // loading until the first check_auth settles
    fn default() -> Self { Self { is_authenticated: false, user: None, token: None, is_loading: true } }
}

impl AuthState {
    fn signed_in(session: IdentitySession) -> Self {
        Self { is_authenticated: true, user: Some(session.user), token: session.token, is_loading: false }
    }

    fn signed_out() -> Self { Self { is_authenticated: false, user: None, token: None, is_loading: false } }
}

/// Owns the authentication state and mutates it only through the four actions below.
/// Construct one per app and pass it where it is needed.
pub struct SessionStore {
    client: Arc<dyn IdentityClient>,
    state: RwLock<AuthState>,
}

impl SessionStore {
    pub fn new(client: Arc<dyn IdentityClient>) -> Self { Self { client, state: RwLock::new(AuthState::default()) } }

    pub fn state(&self) -> AuthState { self.state.read().clone() }

    pub fn is_authenticated(&self) -> bool { self.state.read().is_authenticated }

    pub fn user(&self) -> Option<UserInfo> { self.state.read().user.clone() }

    pub fn token(&self) -> Option<String> { self.state.read().token.clone() }

    /// Evaluate `f` against a permission view of the current user.
    pub fn with_permissions<R>(&self, f: impl FnOnce(Permissions<'_>) -> R) -> R {
        let st = self.state.read();
        f(Permissions::new(st.user.as_ref()))
    }

    fn set(&self, next: AuthState) { *self.state.write() = next; }

    fn set_loading(&self) { self.state.write().is_loading = true; }

    pub async fn login(&self) -> Result<(), AuthError> {
        self.set_loading();
        match self.client.login().await {
            Ok(session) => {
                tprintln!("session.login user={}", session.user.username);
                tracing::info!(target: "sikerma::auth", user = %session.user.username, "login succeeded");
                self.set(AuthState::signed_in(session));
                Ok(())
            }
            Err(e) => {
                tracing::error!(target: "sikerma::auth", "login error: {}", e);
                self.set(AuthState::signed_out());
                Err(e)
            }
        }
    }

    /// Local state is cleared whether or not the provider call succeeds; a failed remote
    /// logout is still returned to the caller.
    pub async fn logout(&self, redirect_uri: Option<&str>) -> Result<(), AuthError> {
        self.set_loading();
        let res = self.client.logout(redirect_uri).await;
        self.set(AuthState::signed_out());
        match res {
            Ok(()) => {
                tprintln!("session.logout");
                Ok(())
            }
            Err(e) => {
                tracing::error!(target: "sikerma::auth", "logout error: {}", e);
                Err(e)
            }
        }
    }

    /// Only the token changes; a failure leaves the state untouched.
    pub async fn refresh_token(&self) -> Result<(), AuthError> {
        match self.client.refresh_token().await {
            Ok(token) => {
                self.state.write().token = token;
                Ok(())
            }
            Err(e) => {
                tracing::error!(target: "sikerma::auth", "token refresh error: {}", e);
                Err(e)
            }
        }
    }

    /// Bootstrap check for an existing session. Never fails: errors and "no session" both
    /// end signed out.
    pub async fn check_auth(&self) {
        self.set_loading();
        match self.client.check_session().await {
            Ok(Some(session)) => {
                tprintln!("session.check user={}", session.user.username);
                self.set(AuthState::signed_in(session));
            }
            Ok(None) => self.set(AuthState::signed_out()),
            Err(e) => {
                tracing::error!(target: "sikerma::auth", "auth check error: {}", e);
                self.set(AuthState::signed_out());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Scripted {
        login: Mutex<Option<Result<IdentitySession, AuthError>>>,
        logout_fails: bool,
        refresh: Mutex<Option<Result<Option<String>, AuthError>>>,
        check: Mutex<Option<Result<Option<IdentitySession>, AuthError>>>,
    }

    #[async_trait]
    impl IdentityClient for Scripted {
        async fn login(&self) -> Result<IdentitySession, AuthError> { self.login.lock().take().unwrap_or(Err(AuthError::NoSession)) }
        async fn logout(&self, _redirect: Option<&str>) -> Result<(), AuthError> {
            if self.logout_fails { Err(AuthError::Url("down".into())) } else { Ok(()) }
        }
        async fn refresh_token(&self) -> Result<Option<String>, AuthError> { self.refresh.lock().take().unwrap_or(Err(AuthError::NoSession)) }
        async fn check_session(&self) -> Result<Option<IdentitySession>, AuthError> { self.check.lock().take().unwrap_or(Ok(None)) }
    }

    fn session(name: &str, roles: &[&str]) -> IdentitySession {
        IdentitySession {
            user: UserInfo { id: name.into(), username: name.into(), roles: roles.iter().map(|r| r.to_string()).collect(), ..Default::default() },
            token: Some(format!("tok-{}", name)),
        }
    }

    #[tokio::test]
    async fn starts_loading_and_unauthenticated() {
        let store = SessionStore::new(Arc::new(Scripted::default()));
        let st = store.state();
        assert!(st.is_loading);
        assert!(!st.is_authenticated);
        assert_eq!(st.user, None);
    }

    #[tokio::test]
    async fn login_success_then_failure_clears() {
        let client = Arc::new(Scripted::default());
        *client.login.lock() = Some(Ok(session("budi", &["staff"])));
        let store = SessionStore::new(client.clone());
        store.login().await.unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok-budi"));
        assert!(store.with_permissions(|p| p.has_permission("kepegawaian", "create")));

        *client.login.lock() = Some(Err(AuthError::Provider { status: 401, error: "invalid_grant".into(), description: None }));
        let err = store.login().await.unwrap_err();
        assert!(matches!(err, AuthError::Provider { status: 401, .. }));
        assert_eq!(store.state(), AuthState::signed_out());
    }

    #[tokio::test]
    async fn logout_clears_even_when_remote_fails() {
        let client = Arc::new(Scripted { logout_fails: true, ..Default::default() });
        *client.login.lock() = Some(Ok(session("sari", &["officer"])));
        let store = SessionStore::new(client);
        store.login().await.unwrap();
        assert!(store.logout(Some("http://localhost:3000")).await.is_err());
        let st = store.state();
        assert!(!st.is_authenticated);
        assert!(!st.is_loading);
        assert_eq!(st.token, None);
    }

    #[tokio::test]
    async fn refresh_updates_only_the_token() {
        let client = Arc::new(Scripted::default());
        *client.login.lock() = Some(Ok(session("budi", &["staff"])));
        let store = SessionStore::new(client.clone());
        store.login().await.unwrap();

        *client.refresh.lock() = Some(Ok(Some("tok-2".into())));
        store.refresh_token().await.unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-2"));
        assert_eq!(store.user().map(|u| u.username), Some("budi".to_string()));

        // failure propagates and keeps the previous token
        assert!(store.refresh_token().await.is_err());
        assert_eq!(store.token().as_deref(), Some("tok-2"));
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn check_auth_paths() {
        let client = Arc::new(Scripted::default());
        let store = SessionStore::new(client.clone());

        store.check_auth().await;
        assert_eq!(store.state(), AuthState::signed_out());

        *client.check.lock() = Some(Ok(Some(session("admin", &["admin"]))));
        store.check_auth().await;
        assert!(store.is_authenticated());
        assert!(store.with_permissions(|p| p.has_permission("rbac", "delete")));

        *client.check.lock() = Some(Err(AuthError::InvalidToken("bad".into())));
        store.check_auth().await;
        assert_eq!(store.state(), AuthState::signed_out());
    }
}
