//! HTTP endpoints.
//!
//! Uploads are JSON with base64 payloads and need a token. Everything else is
//! public: the viewer page, its JSON form, raw downloads, rendered images,
//! static fonts and a health probe.

use std::path::PathBuf;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nfostore::BlobKind;
use serde_json::{json, Map, Value};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::auth::{require_token, TokenSet};
use crate::groups::{viewer_url, Download, GroupError, GroupService, NewGroup, NewSidecar};
use crate::pages::Pages;

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub groups: GroupService,
    pub tokens: TokenSet,
    pub pages: Pages,
    /// Served under `/fonts`; may also hold `favicon.ico`.
    pub static_dir: PathBuf,
    pub start_time: Instant,
}

pub fn router(state: WebState) -> Router {
    let upload = Router::new()
        .route("/upload_nfo", post(upload_nfo))
        .route_layer(middleware::from_fn_with_state(state.tokens.clone(), require_token));

    Router::new()
        .merge(upload)
        .route("/viewer/{id}", get(viewer))
        .route("/viewer/{id}/meta", get(viewer_meta))
        .route("/download/{id}", get(download_raw))
        .route("/download_sfv/{id}", get(download_sidecar))
        .route("/image/{id}", get(image))
        .route("/health", get(health))
        .route_service("/favicon.ico", ServeFile::new(state.static_dir.join("favicon.ico")))
        .nest_service("/fonts", ServeDir::new(&state.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields an upload must carry, in the order they are reported.
const REQUIRED_FIELDS: [&str; 4] = ["nfo_data", "release", "filename", "save"];

fn upload_reply(status: StatusCode, url: Option<String>, message: impl Into<String>) -> Response {
    (status, Json(json!({"url": url, "message": message.into()}))).into_response()
}

/// Render a scalar JSON field as text. Clients send counts and sizes as
/// either numbers or strings.
fn text(body: &Map<String, Value>, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Translate the upload body into a `NewGroup`, or the list of absent keys.
fn parse_upload(body: &Map<String, Value>) -> Result<NewGroup, Vec<String>> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|key| body.get(**key).is_none_or(Value::is_null))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let sidecars = match body.get("sfv") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry.as_object() {
                Some(entry) => NewSidecar {
                    data_b64: text(entry, "sfv_data").unwrap_or_default(),
                    name: text(entry, "name").unwrap_or_default(),
                    path: text(entry, "path"),
                },
                None => NewSidecar::default(),
            })
            .collect(),
        Some(_) => return Err(vec!["sfv".to_string()]),
    };

    Ok(NewGroup {
        payload_b64: text(body, "nfo_data").unwrap_or_default(),
        release: text(body, "release").unwrap_or_default(),
        filename: text(body, "filename").unwrap_or_default(),
        save: body.get("save").is_some_and(truthy),
        date: text(body, "date"),
        files: text(body, "files"),
        size: text(body, "size"),
        sidecars,
    })
}

#[tracing::instrument(name = "http.upload", skip_all)]
async fn upload_nfo(
    State(state): State<WebState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(Value::Object(body))) => body,
        Ok(Json(_)) => return upload_reply(StatusCode::BAD_REQUEST, None, "Expected a JSON object"),
        Err(rejection) => {
            tracing::info!(error = %rejection, "Rejected upload body");
            return upload_reply(StatusCode::BAD_REQUEST, None, rejection.body_text());
        }
    };

    let new = match parse_upload(&body) {
        Ok(new) => new,
        Err(missing) => {
            let message = format!("Missing fields: {}", missing.join(", "));
            return upload_reply(StatusCode::BAD_REQUEST, None, message);
        }
    };

    match state.groups.create(new).await {
        Ok(id) => upload_reply(StatusCode::OK, Some(viewer_url(&id)), "Success"),
        Err(e @ GroupError::Validation(_)) => upload_reply(e.status_code(), None, e.to_string()),
        Err(e @ GroupError::Decode { .. }) => {
            tracing::info!(error = %e, "Upload payload failed to decode");
            upload_reply(e.status_code(), None, e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload failed");
            upload_reply(e.status_code(), None, "Error")
        }
    }
}

fn internal_error(e: GroupError) -> Response {
    tracing::error!(error = %e, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
}

fn page(status: StatusCode, rendered: anyhow::Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

#[tracing::instrument(name = "http.viewer", skip(state))]
async fn viewer(State(state): State<WebState>, Path(id): Path<String>) -> Response {
    match state.groups.lookup(&id).await {
        Ok(Some(view)) => page(StatusCode::OK, state.pages.viewer(&view)),
        Ok(None) => page(StatusCode::NOT_FOUND, state.pages.not_found()),
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(name = "http.viewer.meta", skip(state))]
async fn viewer_meta(State(state): State<WebState>, Path(id): Path<String>) -> Response {
    match state.groups.lookup(&id).await {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Header-safe version of a user-supplied filename.
fn attachment_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

fn attachment(download: Download) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, BlobKind::Raw.mime_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment_name(&download.filename)),
        )
        .body(Body::from(download.bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[tracing::instrument(name = "http.download", skip(state))]
async fn download_raw(State(state): State<WebState>, Path(id): Path<String>) -> Response {
    match state.groups.fetch_raw(&id).await {
        Ok(Some(download)) => attachment(download),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(name = "http.download_sfv", skip(state))]
async fn download_sidecar(State(state): State<WebState>, Path(id): Path<String>) -> Response {
    match state.groups.fetch_sidecar_raw(&id).await {
        Ok(Some(download)) => attachment(download),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(name = "http.image", skip(state))]
async fn image(State(state): State<WebState>, Path(id): Path<String>) -> Response {
    match state.groups.fetch_image(&id).await {
        Ok(Some(png)) => {
            ([(header::CONTENT_TYPE, BlobKind::Image.mime_type())], png).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

async fn health(State(state): State<WebState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "pending_evictions": state.groups.pending_evictions(),
    }))
}
