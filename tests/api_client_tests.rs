//! API client against an in-process axum backend on an ephemeral port.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use sikerma::api::{endpoints, AbortController, ApiClient, ApiClientOptions, ApiError, ApiResponse, Page, RequestOptions, UploadFile};
use sikerma::model::StatistikKepegawaian;

fn header(headers: &HeaderMap, name: &str) -> Value {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| Value::String(s.to_string())).unwrap_or(Value::Null)
}

async fn health() -> Json<Value> { Json(json!({"success": true, "data": {"status": "ok"}})) }

async fn echo(Query(q): Query<BTreeMap<String, String>>, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "query": q,
            "authorization": header(&headers, "authorization"),
            "request_id": header(&headers, "x-request-id"),
            "content_type": header(&headers, "content-type"),
        }
    }))
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> { Json(json!({"success": true, "data": body})) }

async fn pegawai_detail(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Pegawai tidak ditemukan", "request_id": "req-404"})));
    }
    (StatusCode::OK, Json(json!({"success": true, "data": {"id": id}})))
}

async fn pegawai_list(Query(q): Query<BTreeMap<String, String>>) -> Json<Value> {
    let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "success": true,
        "data": [{"nip": "198501012010011001"}, {"nip": "199002022015032002"}],
        "pagination": {"page": page, "limit": 2, "total": 5, "total_pages": 3}
    }))
}

async fn statistik() -> Json<Value> {
    Json(json!({"success": true, "data": {"total_pegawai": 7, "pns": 5, "non_pns": 2, "per_status": {"aktif": 7}}}))
}

async fn conflict() -> impl IntoResponse {
    (
        StatusCode::CONFLICT,
        Json(json!({"success": false, "error": {"code": "CONFLICT_NIP_EXISTS", "message": "NIP sudah terdaftar", "details": {"field": "nip"}}})),
    )
}

async fn rate_limited() -> impl IntoResponse {
    (StatusCode::TOO_MANY_REQUESTS, Json(json!({"success": false, "error": {"code": "LOGIN_RATE_LIMIT_EXCEEDED", "message": "Terlalu banyak percobaan"}})))
}

async fn bad_gateway() -> impl IntoResponse { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({"success": true}))
}

async fn remove() -> StatusCode { StatusCode::NO_CONTENT }

async fn upload(headers: HeaderMap, mut mp: Multipart) -> Json<Value> {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let mime = field.content_type().map(|s| s.to_string());
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        parts.push(json!({"name": name, "file_name": file_name, "mime": mime, "size": size}));
    }
    Json(json!({"success": true, "data": {"content_type": header(&headers, "content-type"), "parts": parts}}))
}

async fn start_backend() -> Result<String> {
    let api = Router::new()
        .route("/health", get(health))
        .route("/echo", get(echo).post(echo_body))
        .route("/kepegawaian/pegawai", get(pegawai_list))
        .route("/kepegawaian/pegawai/{id}", get(pegawai_detail))
        .route("/kepegawaian/pegawai/{id}/upload-foto", post(upload))
        .route("/kepegawaian/statistik", get(statistik))
        .route("/conflict", get(conflict))
        .route("/limited", get(rate_limited))
        .route("/gateway", get(bad_gateway))
        .route("/slow", get(slow))
        .route("/item", delete(remove));
    let app = Router::new().nest("/api/v1", api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("fake backend error: {e:?}");
        }
    });
    Ok(format!("http://{}/api/v1", addr))
}

async fn client() -> Result<ApiClient> {
    let base_url = start_backend().await?;
    Ok(ApiClient::new(ApiClientOptions { base_url, ..Default::default() })?)
}

#[tokio::test]
async fn get_unwraps_envelope() -> Result<()> {
    let api = client().await?;
    let resp: ApiResponse<Value> = api.get(endpoints::HEALTH, RequestOptions::new()).await?;
    assert!(resp.success);
    assert_eq!(resp.data, Some(json!({"status": "ok"})));

    let stat: ApiResponse<StatistikKepegawaian> = api.get(endpoints::KEPEGAWAIAN_STATISTIK, RequestOptions::new()).await?;
    assert_eq!(stat.into_data(200)?.map(|s| s.total_pegawai), Some(7));
    Ok(())
}

#[tokio::test]
async fn list_with_pagination_and_params() -> Result<()> {
    let api = client().await?;
    let opts = RequestOptions::new().param("page", 2).param_opt::<_, String>("search", None);
    let resp: ApiResponse<Vec<Value>> = api.get(endpoints::PEGAWAI, opts).await?;
    let page = Page::try_from(resp)?;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.page, 2);
    assert_eq!(page.pagination.total_pages, 3);
    Ok(())
}

#[tokio::test]
async fn query_headers_and_request_id() -> Result<()> {
    let api = client().await?;
    let opts = RequestOptions::new().param("satker_id", "PA Bandung").param_opt("unit", Some(3)).param_opt::<_, u32>("golongan", None);
    let resp: ApiResponse<Value> = api.get("/echo", opts).await?;
    let data = resp.data.unwrap_or_default();
    assert_eq!(data["query"], json!({"satker_id": "PA Bandung", "unit": "3"}));
    assert_eq!(data["authorization"], Value::Null);
    assert_eq!(data["content_type"], "application/json");
    let rid = data["request_id"].as_str().unwrap_or_default();
    assert!(uuid::Uuid::parse_str(rid).is_ok(), "generated request id: {rid}");

    let resp: ApiResponse<Value> = api.get("/echo", RequestOptions::new().header("X-Request-ID", "trace-42")).await?;
    assert_eq!(resp.data.unwrap_or_default()["request_id"], "trace-42");
    Ok(())
}

#[tokio::test]
async fn bearer_token_set_and_cleared() -> Result<()> {
    let api = client().await?;
    api.set_auth_token("tok-abc")?;
    let resp: ApiResponse<Value> = api.get("/echo", RequestOptions::new()).await?;
    assert_eq!(resp.data.unwrap_or_default()["authorization"], "Bearer tok-abc");

    api.clear_auth_token();
    let resp: ApiResponse<Value> = api.get("/echo", RequestOptions::new()).await?;
    assert_eq!(resp.data.unwrap_or_default()["authorization"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn post_sends_json_body() -> Result<()> {
    let api = client().await?;
    let body = json!({"nip": "198501012010011001", "nama_lengkap": "Siti Aminah"});
    let resp: ApiResponse<Value> = api.post("/echo", &body, RequestOptions::new()).await?;
    assert_eq!(resp.data, Some(body));
    Ok(())
}

#[tokio::test]
async fn not_found_carries_message_and_request_id() -> Result<()> {
    let api = client().await?;
    let err = api.get::<ApiResponse<Value>>(&endpoints::pegawai_detail("missing"), RequestOptions::new()).await.unwrap_err();
    match &err {
        ApiError::Status { message, code, request_id, .. } => {
            assert_eq!(message, "Pegawai tidak ditemukan");
            assert_eq!(*code, 404);
            assert_eq!(request_id.as_deref(), Some("req-404"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    let ok: ApiResponse<Value> = api.get(&endpoints::pegawai_detail("abc"), RequestOptions::new()).await?;
    assert_eq!(ok.data, Some(json!({"id": "abc"})));
    Ok(())
}

#[tokio::test]
async fn envelope_errors_and_non_json_bodies() -> Result<()> {
    let api = client().await?;
    let err = api.get::<Value>("/conflict", RequestOptions::new()).await.unwrap_err();
    assert_eq!(err.code(), Some(409));
    assert_eq!(err.error_code(), Some("CONFLICT_NIP_EXISTS"));
    assert!(err.to_string().starts_with("NIP sudah terdaftar"));

    let err = api.get::<Value>("/limited", RequestOptions::new()).await.unwrap_err();
    assert!(err.is_rate_limited());

    let err = api.get::<Value>("/gateway", RequestOptions::new()).await.unwrap_err();
    assert_eq!(err.code(), Some(502));
    assert!(err.to_string().starts_with("Bad Gateway"));
    Ok(())
}

#[tokio::test]
async fn no_content_decodes_as_unit() -> Result<()> {
    let api = client().await?;
    let () = api.delete("/item", RequestOptions::new()).await?;
    let v: Option<Value> = api.delete("/item", RequestOptions::new()).await?;
    assert!(v.is_none());
    Ok(())
}

#[tokio::test]
async fn timeout_is_distinct_from_status() -> Result<()> {
    let api = client().await?;
    let err = api.get::<Value>("/slow", RequestOptions::new().timeout(Duration::from_millis(100))).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { after } if after == Duration::from_millis(100)), "{err:?}");
    assert_eq!(err.code(), None);
    Ok(())
}

#[tokio::test]
async fn caller_abort_wins_over_timeout() -> Result<()> {
    let api = client().await?;
    let ctl = AbortController::new();
    let opts = RequestOptions::new().signal(ctl.signal()).timeout(Duration::from_secs(10));
    let (res, _) = tokio::join!(api.get::<Value>("/slow", opts), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctl.abort();
    });
    assert!(matches!(res, Err(ApiError::Aborted)));

    // an already fired signal never reaches the network
    let err = api.get::<Value>(endpoints::HEALTH, RequestOptions::new().signal(ctl.signal())).await.unwrap_err();
    assert!(matches!(err, ApiError::Aborted));
    Ok(())
}

#[tokio::test]
async fn upload_sends_multipart_file_part() -> Result<()> {
    let api = client().await?;
    let file = UploadFile::new("foto.png", vec![0x89, b'P', b'N', b'G', 0, 1, 2]).with_mime("image/png");
    let resp: ApiResponse<Value> = api.upload(&endpoints::pegawai_foto("abc"), file, RequestOptions::new()).await?;
    let data = resp.data.unwrap_or_default();
    assert!(data["content_type"].as_str().unwrap_or_default().starts_with("multipart/form-data; boundary="));
    assert_eq!(data["parts"], json!([{"name": "file", "file_name": "foto.png", "mime": "image/png", "size": 7}]));
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_transport() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let api = ApiClient::new(ApiClientOptions { base_url: format!("http://{}/api/v1", addr), ..Default::default() })?;
    let err = api.get::<Value>(endpoints::HEALTH, RequestOptions::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    Ok(())
}
