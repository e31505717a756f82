use std::collections::BTreeSet;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::role::{Role, ADMIN_ROLE};

/// The signed-in user as the portal sees it, built from the identity provider's token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl UserInfo {
    pub fn is_admin(&self) -> bool { self.roles.contains(ADMIN_ROLE) }

    pub fn authority(&self) -> Option<Role> { Role::highest(self.roles.iter().map(String::as_str)) }

    pub fn from_claims(c: &TokenClaims) -> Self {
        Self {
            id: c.sub.clone().unwrap_or_default(),
            username: c.preferred_username.clone().unwrap_or_default(),
            email: c.email.clone().unwrap_or_default(),
            name: c.name.clone().unwrap_or_default(),
            roles: c.realm_access.as_ref().map(|r| r.roles.iter().cloned().collect()).unwrap_or_default(),
            given_name: c.given_name.clone(),
            family_name: c.family_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The subset of access-token claims the portal reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
    /// Expiry, seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// True when the token is past `exp` or within `leeway_secs` of it. Tokens without `exp` never expire.
    pub fn expires_within(&self, leeway_secs: i64, now_secs: i64) -> bool {
        self.exp.map(|exp| exp.saturating_sub(leeway_secs) <= now_secs).unwrap_or(false)
    }
}

/// Read the payload segment of a compact JWT.
/// The signature is not checked: the backend verifies tokens against the realm JWKS,
/// the portal only needs the claims for display and UI gating.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(p), Some(_)) if !p.is_empty() => p,
        _ => return Err(AuthError::InvalidToken("expected three dot-separated segments".into())),
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("payload is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidToken(format!("payload is not claims json: {}", e)))
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.{}",
        enc.encode(br#"{"alg":"none","typ":"JWT"}"#),
        enc.encode(claims.to_string()),
        enc.encode(b"sig")
    )
}
