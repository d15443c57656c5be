//! REST API for the document Q&A session
//!
//! Exposes upload, analysis, chat and settings over HTTP.
//! One shared session; requests are served one at a time.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::QaError;
use crate::models::{DocumentBody, SheetData};
use crate::session::{LoadedDocument, Session};

const SHEET_PREVIEW_ROWS: usize = 10;
const TABLE_PREVIEW_ROWS: usize = 5;
/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(status: StatusCode, message: impl Into<String>) -> ApiResult {
    (status, Json(ApiResponse::error(message.into())))
}

fn no_document() -> ApiResult {
    fail(
        StatusCode::NOT_FOUND,
        "Please upload and process a document first!",
    )
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Mutex<Session>>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Upload Endpoint
/// =============================

fn upload_summary(doc: &LoadedDocument) -> serde_json::Value {
    let mut summary = serde_json::json!({
        "name": doc.upload.name,
        "file_type": doc.upload.kind,
        "extension": doc.upload.extension,
        "size_kb": format!("{:.1}", doc.upload.size as f64 / 1024.0),
        "fingerprint": doc.fingerprint,
        "metrics": doc.result.metrics,
    });

    match &doc.result.body {
        DocumentBody::Spreadsheet { sheets } => {
            summary["sheets"] = serde_json::json!(doc.result.sheet_names());
            summary["total_sheets"] = serde_json::json!(sheets.len());
            summary["financial_tables_found"] = serde_json::json!(doc.result.tables.len());
        }
        DocumentBody::Pdf { page_count } => {
            summary["pages"] = serde_json::json!(page_count);
            summary["text_length"] = serde_json::json!(doc.result.text_len());
        }
    }

    summary
}

async fn upload(State(state): State<ApiState>, mut multipart: Multipart) -> ApiResult {
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)),
        };

        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => file = Some((name, bytes.to_vec())),
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)),
        }
    }

    let Some((name, bytes)) = file else {
        return fail(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    info!(name = %name, bytes = bytes.len(), "Received upload");

    let mut session = state.session.lock().await;
    match session.upload(&name, &bytes) {
        Ok(doc) => ok(upload_summary(doc)),
        Err(QaError::Validation(e)) => fail(StatusCode::BAD_REQUEST, e.to_string()),
        Err(QaError::ExtractionError(message)) => {
            fail(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Upload failed: {}", e))
        }
    }
}

/// =============================
/// Analysis Endpoint
/// =============================

#[derive(Debug, Serialize)]
struct SheetPreview<'a> {
    name: &'a str,
    rows: usize,
    columns: usize,
    preview: SheetData,
}

#[derive(Debug, Serialize)]
struct TablePreview<'a> {
    kind: String,
    sheet_name: &'a str,
    preview: SheetData,
}

async fn analysis(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.lock().await;
    let Some(doc) = session.document() else {
        return no_document();
    };
    let result = &doc.result;

    let data = match &result.body {
        DocumentBody::Spreadsheet { sheets } => {
            let sheets: Vec<SheetPreview> = sheets
                .iter()
                .map(|sheet| SheetPreview {
                    name: &sheet.name,
                    rows: sheet.row_count(),
                    columns: sheet.column_count(),
                    preview: sheet.head(SHEET_PREVIEW_ROWS),
                })
                .collect();

            let tables: Vec<TablePreview> = result
                .tables
                .iter()
                .map(|table| TablePreview {
                    kind: table.kind.to_string(),
                    sheet_name: &table.sheet_name,
                    preview: table.data.head(TABLE_PREVIEW_ROWS),
                })
                .collect();

            serde_json::json!({
                "type": "spreadsheet",
                "sheets": sheets,
                "financial_tables": tables,
                "metrics": result.metrics,
            })
        }
        DocumentBody::Pdf { page_count } => serde_json::json!({
            "type": "pdf",
            "pages": page_count,
            "text_length": result.text_len(),
            "text_preview": result.text_preview(),
            "metrics": result.metrics,
        }),
    };

    ok(data)
}

/// =============================
/// Chat Endpoints
/// =============================

async fn chat(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    let question = req.question.trim();
    if question.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Question must not be empty");
    }

    let mut session = state.session.lock().await;
    match session.ask(question).await {
        Ok(turn) => ok(turn),
        Err(QaError::NoDocument) => no_document(),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn history(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.lock().await;
    ok(session.history())
}

async fn clear_history(State(state): State<ApiState>) -> ApiResult {
    let mut session = state.session.lock().await;
    let cleared = session.history().len();
    session.clear_history();
    ok(serde_json::json!({ "cleared": cleared }))
}

/// =============================
/// Settings Endpoints
/// =============================

async fn settings(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.lock().await;
    let dispatcher = session.dispatcher();
    let available = dispatcher.is_model_available().await;

    ok(serde_json::json!({
        "model": dispatcher.model_name(),
        "model_available": available,
        "answer_mode": if available { "model" } else { "pattern_matching" },
        "questions_asked": session.history().len(),
        "documents_processed": session.documents_processed(),
        "max_upload_mb": session.max_upload_bytes() / (1024 * 1024),
    }))
}

async fn refresh_model(State(state): State<ApiState>) -> ApiResult {
    let session = state.session.lock().await;
    let available = session.dispatcher().refresh_availability().await;
    ok(serde_json::json!({ "model_available": available }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(session: Session) -> Router {
    let body_limit = usize::try_from(session.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let state = ApiState {
        session: Arc::new(Mutex::new(session)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/analysis", get(analysis))
        .route("/api/chat", post(chat))
        .route("/api/history", get(history).delete(clear_history))
        .route("/api/settings", get(settings))
        .route("/api/settings/refresh", post(refresh_model))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    session: Session,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(session);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
