use std::time::Duration;

use thiserror::Error;

use crate::error::{codes, AppError};

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {code})")]
    Status {
        message: String,
        code: u16,
        request_id: Option<String>,
        details: Option<serde_json::Value>,
        /// Backend error code from the envelope (`AUTH_TOKEN_EXPIRED`, ...), when present.
        error_code: Option<String>,
    },
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("request aborted")]
    Aborted,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A header, body or upload part could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status for `Status` errors.
    pub fn code(&self) -> Option<u16> {
        match self { ApiError::Status { code, .. } => Some(*code), _ => None }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self { ApiError::Status { request_id, .. } => request_id.as_deref(), _ => None }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self { ApiError::Status { error_code, .. } => error_code.as_deref(), _ => None }
    }

    pub fn is_unauthorized(&self) -> bool { self.code() == Some(401) }

    pub fn is_rate_limited(&self) -> bool {
        self.code() == Some(429) || self.error_code().map(codes::is_rate_limit).unwrap_or(false)
    }

    /// Timeouts and caller aborts are not backend failures.
    pub fn is_cancelled(&self) -> bool { matches!(self, ApiError::Timeout { .. } | ApiError::Aborted) }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match &e {
            ApiError::Status { code, error_code, message, .. } => {
                let fallback = match *code {
                    400 | 422 => codes::VAL_INVALID_FORMAT,
                    401 => codes::AUTH_INVALID_TOKEN,
                    403 => codes::AUTHZ_FORBIDDEN,
                    404 => codes::NOT_FOUND_RESOURCE,
                    429 => codes::RATE_LIMIT_EXCEEDED,
                    503 => codes::SVC_UNAVAILABLE,
                    _ => codes::SYS_INTERNAL_ERROR,
                };
                AppError::from_backend(*code, error_code.as_deref().unwrap_or(fallback), message)
            }
            ApiError::Timeout { .. } | ApiError::Transport(_) => AppError::unavailable(codes::SVC_UNAVAILABLE.to_string(), e.to_string()),
            ApiError::Aborted | ApiError::Decode(_) | ApiError::InvalidUrl(_) | ApiError::InvalidRequest(_) => {
                AppError::internal(codes::SYS_INTERNAL_ERROR.to_string(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, error_code: Option<&str>) -> ApiError {
        ApiError::Status { message: "x".into(), code, request_id: Some("req-1".into()), details: None, error_code: error_code.map(String::from) }
    }

    #[test]
    fn helpers() {
        assert!(status(401, None).is_unauthorized());
        assert!(status(429, None).is_rate_limited());
        assert!(!status(400, Some("VAL_REQUIRED_FIELD")).is_rate_limited());
        assert!(status(400, Some("LOGIN_RATE_LIMIT_EXCEEDED")).is_rate_limited());
        assert_eq!(status(404, None).request_id(), Some("req-1"));
        assert_eq!(ApiError::Aborted.code(), None);
        assert!(ApiError::Timeout { after: Duration::from_millis(5) }.is_cancelled());
        assert!(!status(500, None).is_cancelled());
    }

    #[test]
    fn maps_into_app_error() {
        let app: AppError = status(404, None).into();
        assert_eq!(app.http_status(), 404);
        assert_eq!(app.code_str(), codes::NOT_FOUND_RESOURCE);
        let app: AppError = status(401, Some("AUTH_TOKEN_EXPIRED")).into();
        assert_eq!(app.code_str(), "AUTH_TOKEN_EXPIRED");
        assert_eq!(app.http_status(), 401);
        let app: AppError = status(409, None).into();
        assert!(matches!(app, AppError::Conflict { .. }));
        let app: AppError = ApiError::Timeout { after: Duration::from_secs(1) }.into();
        assert_eq!(app.http_status(), 503);
    }
}
