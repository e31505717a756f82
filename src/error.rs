//! Unified application error model and the backend's error code catalogue.
//! `AppError` is what validation and authorization failures surface as; every variant
//! carries one of the stable codes below and maps onto an HTTP status.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable error codes shared with the SIKERMA REST backend.
pub mod codes {
    // Validation (400)
    pub const VAL_NIP_FORMAT: &str = "VAL_NIP_FORMAT";
    pub const VAL_NIP_DUPLICATE: &str = "VAL_NIP_DUPLICATE";
    pub const VAL_NIK_FORMAT: &str = "VAL_NIK_FORMAT";
    pub const VAL_REQUIRED_FIELD: &str = "VAL_REQUIRED_FIELD";
    pub const VAL_INVALID_FORMAT: &str = "VAL_INVALID_FORMAT";
    pub const VAL_FILE_SIZE: &str = "VAL_FILE_SIZE";
    pub const VAL_FILE_TYPE: &str = "VAL_FILE_TYPE";
    pub const VAL_INVALID_DATE: &str = "VAL_INVALID_DATE";

    // Authentication (401)
    pub const AUTH_INVALID_TOKEN: &str = "AUTH_INVALID_TOKEN";
    pub const AUTH_TOKEN_EXPIRED: &str = "AUTH_TOKEN_EXPIRED";
    pub const AUTH_LOGIN_FAILED: &str = "AUTH_LOGIN_FAILED";
    pub const AUTH_SESSION_EXPIRED: &str = "AUTH_SESSION_EXPIRED";

    // Authorization (403)
    pub const AUTHZ_FORBIDDEN: &str = "AUTHZ_FORBIDDEN";
    pub const AUTHZ_ROLE_INSUFFICIENT: &str = "AUTHZ_ROLE_INSUFFICIENT";
    pub const AUTHZ_UNIT_ACCESS_DENIED: &str = "AUTHZ_UNIT_ACCESS_DENIED";

    // Not found (404)
    pub const NOT_FOUND_PEGAWAI: &str = "NOT_FOUND_PEGAWAI";
    pub const NOT_FOUND_SATKER: &str = "NOT_FOUND_SATKER";
    pub const NOT_FOUND_RESOURCE: &str = "NOT_FOUND_RESOURCE";

    // Conflict (409)
    pub const CONFLICT_NIP_EXISTS: &str = "CONFLICT_NIP_EXISTS";
    pub const CONFLICT_NIK_EXISTS: &str = "CONFLICT_NIK_EXISTS";

    // Rate limiting (429)
    pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
    pub const LOGIN_RATE_LIMIT_EXCEEDED: &str = "LOGIN_RATE_LIMIT_EXCEEDED";
    pub const UPLOAD_RATE_LIMIT_EXCEEDED: &str = "UPLOAD_RATE_LIMIT_EXCEEDED";
    pub const API_RATE_LIMIT_EXCEEDED: &str = "API_RATE_LIMIT_EXCEEDED";

    // System (500) / unavailable (503)
    pub const SYS_INTERNAL_ERROR: &str = "SYS_INTERNAL_ERROR";
    pub const SYS_EXTERNAL_SERVICE: &str = "SYS_EXTERNAL_SERVICE";
    pub const SVC_UNAVAILABLE: &str = "SVC_UNAVAILABLE";
    pub const SVC_AUTH_DOWN: &str = "SVC_AUTH_DOWN";

    /// True for every code the backend uses on HTTP 429.
    pub fn is_rate_limit(code: &str) -> bool {
        code.ends_with("RATE_LIMIT_EXCEEDED")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    RateLimited { code: String, message: String },
    Unavailable { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::RateLimited { code, .. }
            | AppError::Unavailable { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::RateLimited { message, .. }
            | AppError::Unavailable { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn rate_limited<S: Into<String>>(code: S, msg: S) -> Self { AppError::RateLimited { code: code.into(), message: msg.into() } }
    pub fn unavailable<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unavailable { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::RateLimited { .. } => 429,
            AppError::Internal { .. } => 500,
            AppError::Unavailable { .. } => 503,
        }
    }

    /// Rebuild an error from a backend `{code, message}` pair and the HTTP status it came with.
    /// Statuses outside the catalogue fall back on the code prefix, then on `Internal`.
    pub fn from_backend(status: u16, code: &str, message: &str) -> Self {
        let (code, message) = (code.to_string(), message.to_string());
        match status {
            400 | 422 => AppError::UserInput { code, message },
            401 => AppError::Auth { code, message },
            403 => AppError::Forbidden { code, message },
            404 => AppError::NotFound { code, message },
            409 => AppError::Conflict { code, message },
            429 => AppError::RateLimited { code, message },
            503 => AppError::Unavailable { code, message },
            _ if codes::is_rate_limit(&code) => AppError::RateLimited { code, message },
            _ if code.starts_with("VAL_") => AppError::UserInput { code, message },
            _ => AppError::Internal { code, message },
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;
