//! Environment configuration. Every value has a hardcoded fallback; nothing is validated
//! beyond presence, and unparsable numbers fall back as if unset.

use std::env;
use std::time::Duration;

use crate::api::ApiClientOptions;
use crate::identity::KeycloakConfig;

pub const ENV_KEYCLOAK_URL: &str = "SIKERMA_KEYCLOAK_URL";
pub const ENV_KEYCLOAK_REALM: &str = "SIKERMA_KEYCLOAK_REALM";
pub const ENV_KEYCLOAK_CLIENT_ID: &str = "SIKERMA_KEYCLOAK_CLIENT_ID";
pub const ENV_KEYCLOAK_CLIENT_SECRET: &str = "SIKERMA_KEYCLOAK_CLIENT_SECRET";
pub const ENV_PORTAL_URL: &str = "SIKERMA_PORTAL_URL";
pub const ENV_API_URL: &str = "SIKERMA_API_URL";
pub const ENV_API_TIMEOUT_MS: &str = "SIKERMA_API_TIMEOUT_MS";

pub const DEFAULT_KEYCLOAK_URL: &str = "http://localhost:8081";
pub const DEFAULT_KEYCLOAK_REALM: &str = "pengadilan-agama";
pub const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "portal-client";
pub const DEFAULT_PORTAL_URL: &str = "http://localhost:3000";
pub const DEFAULT_API_URL: &str = "http://localhost:3003/api/v1";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Page/limit defaults used by list endpoints.
pub mod pagination {
    pub const PAGE: u32 = 1;
    pub const LIMIT: u32 = 20;
    pub const LIMIT_OPTIONS: [u32; 4] = [10, 20, 50, 100];
}

/// Upload limits the backend enforces; checked client side before sending.
pub mod file_upload {
    pub const MAX_SIZE: u64 = 5 * 1024 * 1024;
    pub const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];
    pub const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".pdf"];

    pub fn extension_allowed(file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub keycloak: KeycloakConfig,
    /// Origin of the portal app; OIDC redirects land under it.
    pub portal_url: String,
    pub api_url: String,
    pub api_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            keycloak: KeycloakConfig {
                url: DEFAULT_KEYCLOAK_URL.to_string(),
                realm: DEFAULT_KEYCLOAK_REALM.to_string(),
                client_id: DEFAULT_KEYCLOAK_CLIENT_ID.to_string(),
                client_secret: None,
            },
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            api_timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> { v.filter(|s| !s.trim().is_empty()) }

impl PortalConfig {
    pub fn from_env() -> Self { Self::from_lookup(|k| env::var(k).ok()) }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = Self::default();
        let timeout_ms = get(ENV_API_TIMEOUT_MS).and_then(|s| s.trim().parse::<u64>().ok()).filter(|ms| *ms > 0);
        Self {
            keycloak: KeycloakConfig {
                url: non_empty(get(ENV_KEYCLOAK_URL)).unwrap_or(d.keycloak.url),
                realm: non_empty(get(ENV_KEYCLOAK_REALM)).unwrap_or(d.keycloak.realm),
                client_id: non_empty(get(ENV_KEYCLOAK_CLIENT_ID)).unwrap_or(d.keycloak.client_id),
                client_secret: non_empty(get(ENV_KEYCLOAK_CLIENT_SECRET)),
            },
            portal_url: non_empty(get(ENV_PORTAL_URL)).unwrap_or(d.portal_url),
            api_url: non_empty(get(ENV_API_URL)).unwrap_or(d.api_url),
            api_timeout: timeout_ms.map(Duration::from_millis).unwrap_or(d.api_timeout),
        }
    }

    /// Where the identity provider sends the browser back after login.
    pub fn callback_url(&self) -> String {
        format!("{}/api/auth/callback", self.portal_url.trim_end_matches('/'))
    }

    pub fn api_options(&self) -> ApiClientOptions {
        ApiClientOptions { base_url: self.api_url.clone(), timeout: self.api_timeout, ..Default::default() }
    }
}
