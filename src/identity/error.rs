use thiserror::Error;

use crate::error::{codes, AppError};

/// Failures raised by the identity client and surfaced through the session store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable grant is available; the user has to go through the provider's login page.
    #[error("login required: continue at {authorization_url}")]
    LoginRequired { authorization_url: String },

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("no active session")]
    NoSession,

    #[error("authorization state mismatch")]
    StateMismatch,

    /// The provider answered with an OAuth error body.
    #[error("identity provider rejected request ({status}): {error}{}", .description.as_deref().map(|d| format!(" - {}", d)).unwrap_or_default())]
    Provider { status: u16, error: String, description: Option<String> },

    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid identity provider url: {0}")]
    Url(String),

    #[error("random source unavailable: {0}")]
    Random(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::LoginRequired { .. } | AuthError::NoSession => codes::AUTH_SESSION_EXPIRED,
            AuthError::InvalidToken(_) | AuthError::StateMismatch => codes::AUTH_INVALID_TOKEN,
            AuthError::Provider { .. } => codes::AUTH_LOGIN_FAILED,
            AuthError::Transport(_) | AuthError::Url(_) => codes::SVC_AUTH_DOWN,
            AuthError::Random(_) => codes::SYS_INTERNAL_ERROR,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Transport(_) | AuthError::Url(_) => AppError::unavailable(err.code().to_string(), err.to_string()),
            AuthError::Random(_) => AppError::internal(err.code().to_string(), err.to_string()),
            _ => AppError::auth(err.code().to_string(), err.to_string()),
        }
    }
}
