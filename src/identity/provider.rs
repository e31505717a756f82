use async_trait::async_trait;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::tprintln;

use super::error::AuthError;
use super::principal::{decode_claims, TokenClaims, UserInfo};

/// Refresh access tokens that expire within this many seconds.
pub const REFRESH_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl KeycloakConfig {
    /// `{url}/realms/{realm}/protocol/openid-connect/{endpoint}`
    pub fn endpoint(&self, endpoint: &str) -> Result<Url, AuthError> {
        let s = format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            self.url.trim_end_matches('/'),
            urlencoding::encode(&self.realm),
            endpoint
        );
        Url::parse(&s).map_err(|e| AuthError::Url(format!("{}: {}", s, e)))
    }
}

/// What a successful login or session check yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySession {
    pub user: UserInfo,
    pub token: Option<String>,
}

/// The external identity provider as seen by the session store.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn login(&self) -> Result<IdentitySession, AuthError>;
    async fn logout(&self, redirect_uri: Option<&str>) -> Result<(), AuthError>;
    /// Returns the (possibly refreshed) access token.
    async fn refresh_token(&self) -> Result<Option<String>, AuthError>;
    /// Silent check for an existing session; `Ok(None)` when there is none.
    async fn check_session(&self) -> Result<Option<IdentitySession>, AuthError>;
}

#[derive(Debug, Clone)]
struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    claims: TokenClaims,
}

impl TokenSet {
    fn session(&self) -> IdentitySession {
        IdentitySession { user: UserInfo::from_claims(&self.claims), token: Some(self.access_token.clone()) }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingAuthorization {
    state: String,
    verifier: String,
    redirect_uri: String,
}

#[derive(Debug, Clone)]
struct StagedCode {
    code: String,
    verifier: String,
    redirect_uri: String,
}

#[derive(Debug, Clone)]
struct PasswordCredentials {
    username: String,
    password: String,
}

fn gen_id() -> Result<String, AuthError> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AuthError::Random(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

fn pkce_challenge(verifier: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn now_secs() -> i64 { chrono::Utc::now().timestamp() }

/// Keycloak OIDC client: authorization-code flow with PKCE (S256), optional direct password
/// grant, refresh and back-channel logout. Holds the token set in memory.
pub struct KeycloakClient {
    config: KeycloakConfig,
    http: reqwest::Client,
    redirect_uri: String,
    credentials: Option<PasswordCredentials>,
    pending: Mutex<Option<PendingAuthorization>>,
    staged: Mutex<Option<StagedCode>>,
    tokens: RwLock<Option<TokenSet>>,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig, redirect_uri: impl Into<String>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            redirect_uri: redirect_uri.into(),
            credentials: None,
            pending: Mutex::new(None),
            staged: Mutex::new(None),
            tokens: RwLock::new(None),
        }
    }

    /// Use the direct-access (password) grant when no authorization code is staged.
    pub fn with_password_grant(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(PasswordCredentials { username: username.into(), password: password.into() });
        self
    }

    pub fn config(&self) -> &KeycloakConfig { &self.config }

    /// Start the authorization-code flow: returns the URL to send the browser to.
    /// The generated `state` and PKCE verifier are remembered for [`complete_login`](Self::complete_login).
    pub fn authorization_url(&self, redirect_uri: Option<&str>) -> Result<String, AuthError> {
        let redirect_uri = redirect_uri.unwrap_or(&self.redirect_uri).to_string();
        let state = gen_id()?;
        let verifier = gen_id()?;
        let mut url = self.config.endpoint("auth")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid")
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce_challenge(&verifier))
            .append_pair("code_challenge_method", "S256");
        *self.pending.lock() = Some(PendingAuthorization { state, verifier, redirect_uri });
        Ok(url.to_string())
    }

    /// Accept the `code`/`state` pair from the provider's redirect. The next
    /// [`IdentityClient::login`] redeems it.
    pub fn complete_login(&self, code: &str, state: &str) -> Result<(), AuthError> {
        let pending = self.pending.lock().take().ok_or(AuthError::StateMismatch)?;
        if pending.state != state {
            return Err(AuthError::StateMismatch);
        }
        *self.staged.lock() = Some(StagedCode { code: code.to_string(), verifier: pending.verifier, redirect_uri: pending.redirect_uri });
        Ok(())
    }

    /// Front-channel logout URL for browsers, with `id_token_hint` when an id token is held.
    pub fn end_session_url(&self, redirect_uri: Option<&str>) -> Result<String, AuthError> {
        let mut url = self.config.endpoint("logout")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("client_id", &self.config.client_id);
            q.append_pair("post_logout_redirect_uri", redirect_uri.unwrap_or(&self.redirect_uri));
            if let Some(id) = self.tokens.read().as_ref().and_then(|t| t.id_token.clone()) {
                q.append_pair("id_token_hint", &id);
            }
        }
        Ok(url.to_string())
    }

    pub fn token(&self) -> Option<String> { self.tokens.read().as_ref().map(|t| t.access_token.clone()) }

    fn client_params(&self, params: &mut Vec<(&'static str, String)>) {
        params.push(("client_id", self.config.client_id.clone()));
        if let Some(secret) = &self.config.client_secret {
            params.push(("client_secret", secret.clone()));
        }
    }

    async fn post_form(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<reqwest::Response, AuthError> {
        let url = self.config.endpoint(endpoint)?;
        let resp = self.http.post(url).form(params).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body: OAuthErrorBody = resp.json().await.unwrap_or(OAuthErrorBody { error: None, error_description: None });
        Err(AuthError::Provider {
            status: status.as_u16(),
            error: body.error.unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            description: body.error_description,
        })
    }

    async fn token_request(&self, mut params: Vec<(&'static str, String)>) -> Result<TokenSet, AuthError> {
        self.client_params(&mut params);
        let resp: TokenResponse = self.post_form("token", &params).await?.json().await?;
        let claims = decode_claims(&resp.access_token)?;
        Ok(TokenSet { access_token: resp.access_token, refresh_token: resp.refresh_token, id_token: resp.id_token, claims })
    }

    fn store(&self, set: TokenSet) -> IdentitySession {
        let session = set.session();
        *self.tokens.write() = Some(set);
        session
    }

    /// A refresh token the realm rejects is dead; the stored set is dropped with it.
    async fn refresh_with(&self, refresh_token: String) -> Result<TokenSet, AuthError> {
        let set = match self.token_request(vec![("grant_type", "refresh_token".to_string()), ("refresh_token", refresh_token)]).await {
            Ok(set) => set,
            Err(e @ AuthError::Provider { .. }) => {
                tracing::warn!(target: "sikerma::auth", "refresh rejected, dropping session: {}", e);
                *self.tokens.write() = None;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        tprintln!("keycloak.refresh user={}", set.claims.preferred_username.as_deref().unwrap_or("-"));
        Ok(set)
    }
}

#[async_trait]
impl IdentityClient for KeycloakClient {
    async fn login(&self) -> Result<IdentitySession, AuthError> {
        let staged = self.staged.lock().take();
        let set = if let Some(staged) = staged {
            self.token_request(vec![
                ("grant_type", "authorization_code".to_string()),
                ("code", staged.code),
                ("redirect_uri", staged.redirect_uri),
                ("code_verifier", staged.verifier),
            ])
            .await?
        } else if let Some(creds) = self.credentials.clone() {
            self.token_request(vec![
                ("grant_type", "password".to_string()),
                ("username", creds.username),
                ("password", creds.password),
                ("scope", "openid".to_string()),
            ])
            .await?
        } else {
            return Err(AuthError::LoginRequired { authorization_url: self.authorization_url(None)? });
        };
        let session = self.store(set);
        tprintln!("keycloak.login user={}", session.user.username);
        Ok(session)
    }

    async fn logout(&self, redirect_uri: Option<&str>) -> Result<(), AuthError> {
        if let Ok(url) = self.end_session_url(redirect_uri) {
            tracing::debug!(target: "sikerma::auth", "front-channel logout available at {}", url);
        }
        let held = self.tokens.write().take();
        let Some(set) = held else { return Ok(()); };
        if let Some(rt) = set.refresh_token {
            let mut params = vec![("refresh_token", rt)];
            self.client_params(&mut params);
            self.post_form("logout", &params).await?;
        }
        Ok(())
    }

    async fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        let current = self.tokens.read().clone().ok_or(AuthError::NoSession)?;
        if !current.claims.expires_within(REFRESH_LEEWAY_SECS, now_secs()) {
            return Ok(Some(current.access_token));
        }
        let rt = current.refresh_token.ok_or(AuthError::NoSession)?;
        let set = self.refresh_with(rt).await?;
        Ok(self.store(set).token)
    }

    async fn check_session(&self) -> Result<Option<IdentitySession>, AuthError> {
        let Some(current) = self.tokens.read().clone() else { return Ok(None); };
        if !current.claims.expires_within(0, now_secs()) {
            return Ok(Some(current.session()));
        }
        let Some(rt) = current.refresh_token else {
            *self.tokens.write() = None;
            return Ok(None);
        };
        let set = self.refresh_with(rt).await?;
        Ok(Some(self.store(set)))
    }
}
