//! Backend response envelope.
//!
//! Every SIKERMA endpoint answers `{success, data?, message?, error?, request_id?}`; list
//! endpoints add pagination, sent as `pagination` by older handlers and `meta` by newer ones.

use serde::{Deserialize, Serialize};

use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn has_next(&self) -> bool { self.page < self.total_pages }
    pub fn has_prev(&self) -> bool { self.page > 1 }
}

/// `error` is either a bare message or a structured `{code, message, details}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeError {
    Detail {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    Message(String),
}

impl EnvelopeError {
    pub fn message(&self) -> &str {
        match self { EnvelopeError::Detail { message, .. } => message, EnvelopeError::Message(m) => m }
    }

    pub fn code(&self) -> Option<&str> {
        match self { EnvelopeError::Detail { code, .. } => Some(code), EnvelopeError::Message(_) => None }
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        match self { EnvelopeError::Detail { details, .. } => details.as_ref(), EnvelopeError::Message(_) => None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, alias = "meta", skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    /// Unwrap `data`, turning `success: false` into an [`ApiError::Status`] carrying the
    /// envelope's error. `status` is the HTTP status the envelope arrived with.
    pub fn into_data(self, status: u16) -> Result<Option<T>, ApiError> {
        if self.success {
            return Ok(self.data);
        }
        let message = self
            .error
            .as_ref()
            .map(|e| e.message().to_string())
            .or(self.message)
            .unwrap_or_else(|| "request failed".to_string());
        Err(ApiError::Status {
            message,
            code: status,
            request_id: self.request_id,
            details: self.error.as_ref().and_then(|e| e.details().cloned()),
            error_code: self.error.as_ref().and_then(|e| e.code().map(String::from)),
        })
    }
}

/// A page of records plus its pagination block.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> TryFrom<ApiResponse<Vec<T>>> for Page<T> {
    type Error = ApiError;

    fn try_from(resp: ApiResponse<Vec<T>>) -> Result<Self, Self::Error> {
        let pagination = resp.pagination.ok_or_else(|| ApiError::Decode("missing pagination".into()))?;
        let items = resp.into_data(200)?.unwrap_or_default();
        Ok(Page { items, pagination })
    }
}
