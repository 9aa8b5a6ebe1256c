//! JSON HTTP API over the ingestion pipeline and the document store.
//!
//! Exposes the upload, retrieval, and reporting surface of Docsight. The
//! caller's identity arrives as an opaque `X-User-Id` header; session
//! management lives outside this service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/documents` | Upload a file (JSON body), run the pipeline, persist |
//! | `GET`  | `/documents` | List the caller's documents, newest first |
//! | `GET`  | `/documents/{id}` | Fetch one full document record |
//! | `GET`  | `/documents/{id}/download` | Original stored bytes |
//! | `GET`  | `/metrics` | Upload counts and entity-label frequency |
//! | `GET`  | `/health` | Health check (version + analyzer provider) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "unsupported_format", "message": "..." } }
//! ```
//!
//! Codes: `bad_request` (400), `unsupported_format` (400), `decode_error`
//! (400), `not_found` (404), `unreadable_file` (422), `internal` (500),
//! `analysis_unavailable` (503, retryable).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::analyzer::create_analyzer;
use crate::config::Config;
use crate::db;
use crate::extract::ExtractError;
use crate::get::{fetch_document, list_documents, DocumentResponse};
use crate::metrics::collect_metrics;
use crate::pipeline::{Pipeline, PipelineError};
use crate::store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: sqlx::SqlitePool,
    pipeline: Arc<Pipeline>,
}

/// Starts the HTTP server.
///
/// The analyzer is constructed exactly once here and shared by every
/// request for the process lifetime. Binds to `[server].bind` and runs
/// until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let analyzer = create_analyzer(&config.analyzer)?;
    let pipeline = Arc::new(Pipeline::new(
        analyzer,
        config.pipeline.max_summary_sentences,
    ));

    let pool = db::connect(config).await?;
    std::fs::create_dir_all(&config.storage.upload_dir)?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        pipeline,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/documents", post(handle_upload).get(handle_list))
        .route("/documents/{id}", get(handle_get))
        .route("/documents/{id}/download", get(handle_download))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "docsight server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

fn internal(message: impl Into<String>) -> AppError {
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Maps pipeline failures to the most appropriate status: rejected
/// uploads are client errors, undecodable files are unprocessable, and
/// analysis outages are retryable service failures.
fn classify_pipeline_error(err: PipelineError) -> AppError {
    match err {
        PipelineError::Extract(ExtractError::UnsupportedFormat(ext)) => app_error(
            StatusCode::BAD_REQUEST,
            "unsupported_format",
            format!("unsupported format: .{}", ext),
        ),
        PipelineError::Extract(ExtractError::Decode(msg)) => {
            app_error(StatusCode::BAD_REQUEST, "decode_error", msg)
        }
        PipelineError::Extract(ExtractError::Unreadable(msg)) => {
            app_error(StatusCode::UNPROCESSABLE_ENTITY, "unreadable_file", msg)
        }
        PipelineError::Linguistic(e) => app_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "analysis_unavailable",
            e.to_string(),
        ),
    }
}

/// The caller's opaque identity, required on owner-scoped routes.
fn require_owner(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or_else(|| bad_request("X-User-Id header required"))
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct UploadRequest {
    filename: String,
    content_base64: String,
}

/// Handler for `POST /documents`.
///
/// Decodes the payload, saves it under the upload directory, runs the
/// full pipeline, and persists the result exactly once. On any pipeline
/// failure the stored upload is removed again, so no partial record and no
/// orphaned file survive a failed request.
async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let owner = require_owner(&headers)?;

    // Keep only the final path component of the client-supplied name.
    let filename = std::path::Path::new(&req.filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("invalid filename"))?
        .to_string();

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&req.content_base64)
        .map_err(|e| bad_request(format!("invalid base64 content: {}", e)))?;

    let stored = state
        .config
        .storage
        .upload_dir
        .join(format!("{}-{}", Uuid::new_v4(), filename));
    std::fs::write(&stored, &bytes)
        .map_err(|e| internal(format!("failed to store upload: {}", e)))?;

    let processed = match state.pipeline.run(&stored, &filename, &owner).await {
        Ok(doc) => doc,
        Err(e) => {
            let _ = std::fs::remove_file(&stored);
            tracing::warn!(%filename, error = %e, "pipeline failed");
            return Err(classify_pipeline_error(e));
        }
    };

    let id = match store::save_document(&state.pool, &processed).await {
        Ok(id) => id,
        Err(e) => {
            let _ = std::fs::remove_file(&stored);
            return Err(internal(format!("failed to persist document: {}", e)));
        }
    };

    tracing::info!(%id, %filename, %owner, "document ingested");

    let doc = fetch_document(&state.pool, &id)
        .await
        .map_err(|e| internal(e.to_string()))?
        .ok_or_else(|| internal("document vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(doc)))
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentResponse>,
}

async fn handle_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DocumentListResponse>, AppError> {
    let owner = require_owner(&headers)?;
    let documents = list_documents(&state.pool, &owner)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(DocumentListResponse { documents }))
}

// ============ GET /documents/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    fetch_document(&state.pool, &id)
        .await
        .map_err(|e| internal(e.to_string()))?
        .map(Json)
        .ok_or_else(|| not_found(format!("document not found: {}", id)))
}

// ============ GET /documents/{id}/download ============

async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let doc = store::get_by_id(&state.pool, &id)
        .await
        .map_err(|e| internal(e.to_string()))?
        .ok_or_else(|| not_found(format!("document not found: {}", id)))?;

    let bytes = std::fs::read(&doc.location)
        .map_err(|e| internal(format!("stored file unavailable: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ============ GET /metrics ============

#[derive(Deserialize)]
struct MetricsParams {
    days: Option<u32>,
}

async fn handle_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> Result<Json<crate::metrics::MetricsReport>, AppError> {
    let days = params.days.unwrap_or(7).clamp(1, 365);
    let report = collect_metrics(&state.pool, days)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(report))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    analyzer: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        analyzer: state.pipeline.analyzer().name().to_string(),
    })
}
