//! HTTP API for the contract pipeline.
//!
//! A thin shim over [`Engine`]: every handler parses its input, calls one
//! engine operation, and serializes the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart upload of a `.txt`/`.pdf` contract |
//! | `POST` | `/qa` | Answer a question over the corpus or one document |
//! | `POST` | `/summarize` | Summarize a stored document |
//! | `POST` | `/risk` | Risk markers for a stored document |
//! | `POST` | `/auto_queries` | Suggested follow-up queries for a document |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one shape:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document not found: x" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `index_not_ready`
//! (409), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::extract::extract_from_named;
use crate::models::{Answer, RiskItem};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated.
pub async fn run_server(engine: Arc<Engine>) -> anyhow::Result<()> {
    let bind_addr = engine.config().server.bind.clone();
    let app = router(engine);

    println!("contract-intel server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with all routes and the permissive CORS layer.
pub fn router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/qa", post(handle_qa))
        .route("/summarize", post(handle_summarize))
        .route("/risk", post(handle_risk))
        .route("/auto_queries", post(handle_auto_queries))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { engine })
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
#[derive(Debug)]
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn index_not_ready(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "index_not_ready".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps engine errors to the most appropriate HTTP status code.
fn engine_error(err: EngineError) -> AppError {
    let message = err.to_string();
    match err {
        EngineError::DocumentNotFound(_) => not_found(message),
        EngineError::IndexNotReady => index_not_ready(message),
        EngineError::UnsupportedFormat(_)
        | EngineError::Extract(_)
        | EngineError::InvalidChunking(_) => bad_request(message),
        _ => internal(message),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    ok: bool,
    doc_id: String,
    chunks: usize,
}

/// Handler for `POST /upload`.
///
/// Expects a multipart `file` field holding a `.txt` or `.pdf` contract.
/// The document is stored under a fresh `user_<uuid>` id and the index is
/// rebuilt before the response is sent.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut uploaded = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request("upload is missing a file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| bad_request(err.to_string()))?;
        uploaded = Some((filename, bytes));
    }
    let (filename, bytes) = uploaded.ok_or_else(|| bad_request("missing 'file' field"))?;

    let text = extract_from_named(&bytes, &filename).map_err(engine_error)?;
    let doc_id = format!("user_{}", Uuid::new_v4().simple());
    let chunks = state
        .engine
        .add_document(&doc_id, &text)
        .await
        .map_err(engine_error)?;

    Ok(Json(UploadResponse {
        ok: true,
        doc_id,
        chunks,
    }))
}

// ============ POST /qa ============

#[derive(Deserialize)]
struct QaParams {
    question: String,
    doc_id: Option<String>,
    top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct QaResponse {
    answers: Vec<Answer>,
}

async fn handle_qa(
    State(state): State<AppState>,
    Form(params): Form<QaParams>,
) -> Result<Json<QaResponse>, AppError> {
    let answers = state
        .engine
        .ask(&params.question, params.doc_id.as_deref(), params.top_k)
        .await
        .map_err(engine_error)?;
    Ok(Json(QaResponse { answers }))
}

// ============ POST /summarize ============

#[derive(Deserialize)]
struct DocParams {
    doc_id: String,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn handle_summarize(
    State(state): State<AppState>,
    Form(params): Form<DocParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = state
        .engine
        .summarize(&params.doc_id)
        .await
        .map_err(engine_error)?;
    Ok(Json(SummaryResponse { summary }))
}

// ============ POST /risk ============

#[derive(Serialize)]
struct RiskResponse {
    risks: Vec<RiskItem>,
}

async fn handle_risk(
    State(state): State<AppState>,
    Form(params): Form<DocParams>,
) -> Result<Json<RiskResponse>, AppError> {
    let risks = state.engine.risks(&params.doc_id).map_err(engine_error)?;
    Ok(Json(RiskResponse { risks }))
}

// ============ POST /auto_queries ============

#[derive(Serialize)]
struct QueriesResponse {
    queries: Vec<String>,
}

async fn handle_auto_queries(
    State(state): State<AppState>,
    Form(params): Form<DocParams>,
) -> Result<Json<QueriesResponse>, AppError> {
    let queries = state
        .engine
        .suggest(&params.doc_id)
        .map_err(engine_error)?;
    Ok(Json(QueriesResponse { queries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StorageConfig};
    use std::path::Path;
    use tempfile::tempdir;

    fn test_state(data_dir: &Path) -> AppState {
        let mut config = Config {
            storage: StorageConfig {
                data_dir: data_dir.to_path_buf(),
                include_globs: vec!["*.txt".to_string()],
            },
            chunking: Default::default(),
            retrieval: Default::default(),
            embedding: Default::default(),
            qa: Default::default(),
            summary: Default::default(),
            server: Default::default(),
        };
        config.embedding.dims = Some(64);
        AppState {
            engine: Arc::new(Engine::new(config).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(body) = handle_health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_qa_handler_answers_question() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        state
            .engine
            .add_document("msa", "Payment is due net thirty from the invoice date.")
            .await
            .unwrap();

        let Json(body) = handle_qa(
            State(state),
            Form(QaParams {
                question: "When is payment due?".to_string(),
                doc_id: None,
                top_k: None,
            }),
        )
        .await
        .unwrap();
        assert!(body.answers[0].text.contains("net thirty"));
    }

    #[tokio::test]
    async fn test_unknown_document_maps_to_404() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let err = handle_summarize(
            State(state),
            Form(DocParams {
                doc_id: "nope".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
    }

    #[tokio::test]
    async fn test_missing_index_maps_to_409() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let err = handle_qa(
            State(state),
            Form(QaParams {
                question: "Anything?".to_string(),
                doc_id: None,
                top_k: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "index_not_ready");
    }

    #[tokio::test]
    async fn test_risk_and_query_handlers() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        state
            .engine
            .add_document("msa", "Termination is allowed on breach.")
            .await
            .unwrap();

        let Json(risks) = handle_risk(
            State(state.clone()),
            Form(DocParams {
                doc_id: "msa".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(risks.risks.iter().any(|r| r.kind == "termination"));

        let Json(queries) = handle_auto_queries(
            State(state),
            Form(DocParams {
                doc_id: "msa".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!queries.queries.is_empty());
    }

    #[test]
    fn test_engine_error_mapping() {
        let err = engine_error(EngineError::DocumentNotFound("x".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = engine_error(EngineError::IndexNotReady);
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = engine_error(EngineError::UnsupportedFormat("docx".to_string()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = engine_error(EngineError::Corrupt("bad".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
