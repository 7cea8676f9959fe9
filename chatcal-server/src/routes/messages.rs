//! Inbound message endpoint

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use chatcal_core::{MessageSummary, process_message};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", post(receive_message))
        .route("/health", get(health))
}

/// Request body for an inbound chat message
#[derive(Deserialize)]
pub struct MessageIn {
    pub text: String,
}

/// POST /messages - classify one message and sync it into the calendar
async fn receive_message(
    State(state): State<AppState>,
    Json(payload): Json<MessageIn>,
) -> Result<Json<MessageSummary>, AppError> {
    let summary = process_message(
        &payload.text,
        state.classifier.as_ref(),
        state.calendar.as_ref(),
        &state.timezone,
    )
    .await?;

    Ok(Json(summary))
}

/// GET /health - liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
