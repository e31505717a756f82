use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::abort::AbortSignal;
use super::error::ApiError;
use crate::config::{DEFAULT_API_TIMEOUT_MS, DEFAULT_API_URL};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct ApiClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra default headers, applied after `Content-Type: application/json`.
    pub headers: Vec<(String, String)>,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_URL.to_string(), timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS), headers: Vec::new() }
    }
}

/// Per-call knobs. `None` query values are skipped.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: Vec<(String, Option<String>)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub signal: Option<AbortSignal>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self { Self::default() }

    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn param_opt<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        self.params.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A file sent as the `file` part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new<S: Into<String>>(file_name: S, bytes: Vec<u8>) -> Self { Self { file_name: file_name.into(), bytes, mime: None } }

    pub fn with_mime<S: Into<String>>(mut self, mime: S) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

enum Body {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Caller-side retry policy for a data layer sitting on top of [`ApiClient`]. The client
/// itself never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT: RetryPolicy = RetryPolicy { max_retries: 1, base_delay: Duration::from_secs(1), max_delay: Duration::from_secs(30) };

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).map(|d| d.min(self.max_delay)).unwrap_or(self.max_delay)
    }

    /// Client errors and cancellations are final; everything else may be retried.
    pub fn should_retry(&self, attempt: u32, err: &ApiError) -> bool {
        if attempt >= self.max_retries || err.is_cancelled() {
            return false;
        }
        !matches!(err.code(), Some(c) if (400..500).contains(&c) && c != 429)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::DEFAULT }
}

/// JSON client for the SIKERMA REST backend.
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    timeout: Duration,
    default_headers: RwLock<HeaderMap>,
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ApiError> {
    let n = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidRequest(format!("header name {}: {}", name, e)))?;
    let v = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidRequest(format!("header {}: {}", name, e)))?;
    Ok((n, v))
}

fn first_str<'a>(v: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| {
        let mut cur = v;
        for key in path.iter() {
            cur = cur.get(key)?;
        }
        cur.as_str().filter(|s| !s.is_empty())
    })
}

async fn wait_abort(signal: Option<&AbortSignal>) {
    match signal {
        Some(s) => s.aborted().await,
        None => std::future::pending::<()>().await,
    }
}

impl ApiClient {
    pub fn new(options: ApiClientOptions) -> Result<Self, ApiError> {
        let base = Url::parse(&options.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", options.base_url, e)))?;
        let client = reqwest::Client::builder().build()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (k, v) in options.headers.iter() {
            let (n, v) = header_pair(k, v)?;
            headers.insert(n, v);
        }
        Ok(Self { base, client, timeout: options.timeout, default_headers: RwLock::new(headers) })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    pub fn timeout(&self) -> Duration { self.timeout }

    /// Current value of a default header.
    pub fn default_header(&self, name: &str) -> Option<String> {
        self.default_headers.read().get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
    }

    /// Subsequent requests carry `Authorization: Bearer <token>`.
    pub fn set_auth_token(&self, token: &str) -> Result<(), ApiError> {
        let mut v = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| ApiError::InvalidRequest(format!("auth token: {}", e)))?;
        v.set_sensitive(true);
        self.default_headers.write().insert(AUTHORIZATION, v);
        Ok(())
    }

    pub fn clear_auth_token(&self) { self.default_headers.write().remove(AUTHORIZATION); }

    /// Resolve `endpoint` against the base URL. Relative endpoints, with or without a leading
    /// '/', extend the base path; only `http://` and `https://` URLs are used as is, so a
    /// segment like `pegawai:export` never reads as a scheme.
    pub fn url_for(&self, endpoint: &str, params: &[(String, Option<String>)]) -> Result<Url, ApiError> {
        let joined = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Url::parse(endpoint)
        } else {
            let mut base = self.base.clone();
            let path = format!("{}/", base.path().trim_end_matches('/'));
            base.set_path(&path);
            base.join(&format!("./{}", endpoint.trim_start_matches('/')))
        };
        let mut url = joined.map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        if params.iter().any(|(_, v)| v.is_some()) {
            let mut q = url.query_pairs_mut();
            for (k, v) in params.iter() {
                if let Some(v) = v {
                    q.append_pair(k, v);
                }
            }
        }
        Ok(url)
    }

    /// Send with `opts.body` as the JSON body, if any.
    pub async fn request<T: DeserializeOwned>(&self, method: Method, endpoint: &str, mut opts: RequestOptions) -> Result<T, ApiError> {
        let body = opts.body.take().map(Body::Json).unwrap_or(Body::Empty);
        self.execute(method, endpoint, body, opts).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, opts: RequestOptions) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, opts).await
    }

    /// The `body` argument wins over `opts.body`, which is ignored. Same for `put` and `patch`.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<T, ApiError> {
        self.with_body(Method::POST, endpoint, body, opts).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<T, ApiError> {
        self.with_body(Method::PUT, endpoint, body, opts).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<T, ApiError> {
        self.with_body(Method::PATCH, endpoint, body, opts).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str, opts: RequestOptions) -> Result<T, ApiError> {
        self.request(Method::DELETE, endpoint, opts).await
    }

    /// POST `file` as multipart form data; `opts.body` is ignored. Any `Content-Type`, default
    /// or per request, is dropped so the HTTP layer sets the one carrying the boundary.
    pub async fn upload<T: DeserializeOwned>(&self, endpoint: &str, file: UploadFile, opts: RequestOptions) -> Result<T, ApiError> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(mime) = file.mime.as_deref() {
            part = part.mime_str(mime).map_err(|e| ApiError::InvalidRequest(format!("upload mime {}: {}", mime, e)))?;
        }
        self.execute(Method::POST, endpoint, Body::Multipart(Form::new().part("file", part)), opts).await
    }

    async fn with_body<T: DeserializeOwned, B: Serialize + ?Sized>(&self, method: Method, endpoint: &str, body: &B, opts: RequestOptions) -> Result<T, ApiError> {
        let v = serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(format!("body: {}", e)))?;
        self.execute(method, endpoint, Body::Json(v), opts).await
    }

    fn headers_for(&self, body: &Body, extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = self.default_headers.read().clone();
        if matches!(body, Body::Multipart(_)) {
            headers.remove(CONTENT_TYPE);
        }
        for (k, v) in extra.iter() {
            let (n, v) = header_pair(k, v)?;
            if n == CONTENT_TYPE && matches!(body, Body::Multipart(_)) {
                continue;
            }
            headers.insert(n, v);
        }
        if !headers.contains_key(REQUEST_ID_HEADER) {
            let id = uuid::Uuid::new_v4().to_string();
            let (n, v) = header_pair(REQUEST_ID_HEADER, &id)?;
            headers.insert(n, v);
        }
        Ok(headers)
    }

    async fn execute<T: DeserializeOwned>(&self, method: Method, endpoint: &str, body: Body, opts: RequestOptions) -> Result<T, ApiError> {
        let url = self.url_for(endpoint, &opts.params)?;
        let headers = self.headers_for(&body, &opts.headers)?;
        let timeout = opts.timeout.unwrap_or(self.timeout);
        let signal = opts.signal.as_ref();
        if signal.map(|s| s.is_aborted()).unwrap_or(false) {
            return Err(ApiError::Aborted);
        }
        let request_id = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
        tracing::debug!(target: "sikerma::api", method = %method, url = %url, request_id = %request_id, "request");

        let mut rb = self.client.request(method.clone(), url.clone()).headers(headers);
        rb = match body {
            Body::Empty => rb,
            Body::Json(v) => rb.json(&v),
            Body::Multipart(form) => rb.multipart(form),
        };
        let exchange = async {
            let resp = rb.send().await?;
            let status = resp.status();
            let header_id = resp.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
            let bytes = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, header_id, bytes))
        };

        let (status, header_id, bytes) = tokio::select! {
            biased;
            _ = wait_abort(signal) => {
                tracing::debug!(target: "sikerma::api", url = %url, "request aborted by caller");
                return Err(ApiError::Aborted);
            }
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(target: "sikerma::api", url = %url, "request timed out after {:?}", timeout);
                return Err(ApiError::Timeout { after: timeout });
            }
            res = exchange => res.map_err(|e| {
                tracing::warn!(target: "sikerma::api", url = %url, "transport error: {}", e);
                ApiError::Transport(e)
            })?,
        };

        let blank = bytes.iter().all(|b| b.is_ascii_whitespace());
        if !status.is_success() {
            let v: Value = if blank { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
            let err = status_error(status, &v, header_id);
            tracing::warn!(target: "sikerma::api", method = %method, url = %url, "{}", err);
            return Err(err);
        }
        let v: Value = if blank || status == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?
        };
        serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn status_error(status: StatusCode, body: &Value, header_id: Option<String>) -> ApiError {
    let message = first_str(body, &[&["message"], &["error", "message"], &["error"]])
        .map(|s| s.to_string())
        .or_else(|| status.canonical_reason().map(|s| s.to_string()))
        .unwrap_or_else(|| status.to_string());
    let request_id = first_str(body, &[&["request_id"]]).map(|s| s.to_string()).or(header_id);
    let details = body.get("details").or_else(|| body.get("error").and_then(|e| e.get("details"))).filter(|d| !d.is_null()).cloned();
    let error_code = first_str(body, &[&["error", "code"], &["code"]]).map(|s| s.to_string());
    ApiError::Status { message, code: status.as_u16(), request_id, details, error_code }
}
