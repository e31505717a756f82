//! Typed client for the SIKERMA REST backend.

pub mod abort;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod response;

pub use abort::{AbortController, AbortSignal};
pub use client::{ApiClient, ApiClientOptions, RequestOptions, RetryPolicy, UploadFile, REQUEST_ID_HEADER};
pub use error::ApiError;
pub use response::{ApiResponse, EnvelopeError, Page, PaginationMeta};
