use std::path::PathBuf;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::error;

use crate::decision::{Decision, HistoryEntry, Label};
use crate::engine::InferenceService;
use crate::error::{ClassifyError, ExportError};

pub const CSV_FILENAME: &str = "spam_detection_history.csv";

#[derive(Clone)]
pub struct AppState {
    pub service: InferenceService,
    /// Directory with `index.html` and the rest of the UI.
    pub static_dir: PathBuf,
}

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/predict", post(predict).get(predict_usage))
        .route("/history", get(list_history).delete(clear_history))
        .route("/download-history", get(download_history))
        .fallback_service(static_files)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct PredictResp {
    label: Label,
    probability: f64,
    text: String,
    // only present on the keyword path
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    fallback: bool,
}

impl From<Decision> for PredictResp {
    fn from(d: Decision) -> Self {
        Self {
            label: d.label,
            probability: d.probability,
            text: d.text,
            fallback: d.used_fallback,
        }
    }
}

fn text_required() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "`text` field is required." })),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

// Lenient body handling: anything that is not an object with a string `text` is a client error.
async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let text = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("text").and_then(Value::as_str).map(str::to_owned));
    let Some(text) = text else {
        return text_required();
    };

    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || service.classify(&text)).await {
        Ok(Ok(decision)) => Json(PredictResp::from(decision)).into_response(),
        Ok(Err(ClassifyError::InvalidInput)) => text_required(),
        Err(e) => {
            error!(error = %e, "predict task failed");
            internal_error()
        }
    }
}

async fn predict_usage() -> Json<Value> {
    Json(json!({
        "error": "This endpoint accepts POST with JSON {\"text\": \"...\"}. Use POST to get predictions."
    }))
}

#[derive(Debug, Serialize)]
struct HistoryOut {
    history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

async fn list_history(State(state): State<AppState>) -> Response {
    let service = state.service.clone();
    let snap = match tokio::task::spawn_blocking(move || service.list_history()).await {
        Ok(snap) => snap,
        Err(e) => {
            error!(error = %e, "history task failed");
            return internal_error();
        }
    };
    match snap.fault {
        None => Json(HistoryOut {
            history: snap.entries,
            error: None,
        })
        .into_response(),
        Some(fault) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HistoryOut {
                history: Vec::new(),
                error: Some(fault.message()),
            }),
        )
            .into_response(),
    }
}

async fn clear_history(State(state): State<AppState>) -> Response {
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || service.clear_history()).await {
        Ok(Ok(())) => Json(json!({ "status": "success", "message": "History cleared" })).into_response(),
        Ok(Err(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Could not clear history file" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "clear task failed");
            internal_error()
        }
    }
}

async fn download_history(State(state): State<AppState>) -> Response {
    let service = state.service.clone();
    let export = match tokio::task::spawn_blocking(move || service.export_history_csv()).await {
        Ok(export) => export,
        Err(e) => {
            error!(error = %e, "export task failed");
            return internal_error();
        }
    };
    match export {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={CSV_FILENAME}"),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(ExportError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No history available" })),
        )
            .into_response(),
    }
}

async fn index(State(state): State<AppState>) -> Response {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => Json(json!({ "ok": true, "message": "API running" })).into_response(),
    }
}
