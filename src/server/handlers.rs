//! API handlers
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;
use crate::{
    advisor::{ChatReply, ChatRequest},
    execution::{ExecutionRequest, ExecutionResult},
    store::StoreError,
};

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub filename: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub filename: String,
}

/// Client-facing error, rendered as `{ "detail": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

fn store_error(state: &AppState, err: StoreError, io_message: impl Fn(&str) -> String) -> ApiError {
    let msgs = &state.messages;
    match err {
        StoreError::InvalidFilename(name) => {
            warn!(filename = %name, "rejected filename");
            ApiError {
                status: StatusCode::BAD_REQUEST,
                detail: msgs.invalid_filename(),
            }
        }
        StoreError::NotFound(_) => ApiError {
            status: StatusCode::NOT_FOUND,
            detail: msgs.file_not_found(),
        },
        StoreError::Io(e) => ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: io_message(&e.to_string()),
        },
    }
}

/// Always 200; the verdict travels in `success`.
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecutionRequest>,
) -> Json<ExecutionResult> {
    Json(state.gateway.execute(&request).await)
}

pub async fn save(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .save(&request.filename, &request.code)
        .await
        .map_err(|e| store_error(&state, e, |d| state.messages.save_error(d)))?;
    Ok(Json(json!({
        "success": true,
        "message": state.messages.saved(&request.filename),
    })))
}

pub async fn load(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<Value>, ApiError> {
    let code = state
        .store
        .load(&request.filename)
        .await
        .map_err(|e| store_error(&state, e, |d| state.messages.load_error(d)))?;
    Ok(Json(json!({ "success": true, "code": code })))
}

pub async fn list_files(State(state): State<AppState>) -> Json<Value> {
    match state.store.list().await {
        Ok(files) => Json(json!({ "success": true, "files": files })),
        Err(e) => {
            warn!(error = %e, "listing store failed");
            Json(json!({ "success": false, "files": [], "error": e.to_string() }))
        }
    }
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(state.advisor.ask(&request).await)
}
