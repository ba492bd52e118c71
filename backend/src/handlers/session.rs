//! Session handlers

use axum::{http::StatusCode, response::IntoResponse, Json};
use shared::models::SessionStat;
use shared::types::ApiResponse;
use uuid::Uuid;

use crate::middleware::ClientSession;
use crate::services::SessionService;
use crate::AppState;

/// Current client session
pub async fn get_session(ClientSession(session): ClientSession) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::data(session)))
}

/// Bump a session counter after a successful create; failures are only logged
pub(crate) async fn count_activity(state: &AppState, session_id: Uuid, stat: SessionStat) {
    let sessions = SessionService::new(state.db.clone());
    if let Err(e) = sessions.record_activity(session_id, stat).await {
        tracing::warn!("Could not update {} for session {}: {}", stat.column(), session_id, e);
    }
}
