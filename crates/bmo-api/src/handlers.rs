//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its input via axum extractors, calls the
//! conversation core held in AppState, and returns a JSON response.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bmo_chat::{SessionStart, Turn, TurnResult};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /api/v1/conversation/respond.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub session_id: Uuid,
    /// Transcribed user utterance.
    pub transcript: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

// =============================================================================
// Conversation
// =============================================================================

/// POST /api/v1/conversation/start - open a session and return the greeting.
pub async fn start_session(State(state): State<AppState>) -> Result<Json<SessionStart>, ApiError> {
    let start = state.conversation.start_session()?;
    Ok(Json(start))
}

/// POST /api/v1/conversation/respond - run one turn for a transcript.
pub async fn respond(
    State(state): State<AppState>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<TurnResult>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if body.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "'transcript' must not be empty".to_string(),
        ));
    }

    let result = state
        .conversation
        .generate_response(body.session_id, &body.transcript)
        .await?;
    Ok(Json(result))
}

/// GET /api/v1/conversation/{session_id}/history - stored turns in order.
pub async fn history(
    State(state): State<AppState>,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Path(session_id) = session_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let turns = state.conversation.store().history(session_id)?;
    Ok(Json(HistoryResponse { session_id, turns }))
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.conversation.store().len(),
    })
}
