//! Field mapping HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::models::SessionStat;
use shared::types::ApiResponse;
use uuid::Uuid;

use super::session::count_activity;
use crate::middleware::{AppJson, ClientSession};
use crate::services::field::{CreateFieldInput, FieldService, UpdateFieldInput};
use crate::AppState;

/// List the caller's fields
pub async fn list_fields(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
) -> impl IntoResponse {
    let service = FieldService::new(state.db.clone());

    match service.list_fields(session.id).await {
        Ok(fields) => (StatusCode::OK, Json(ApiResponse::data(fields))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Map a new field
pub async fn create_field(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    AppJson(input): AppJson<CreateFieldInput>,
) -> impl IntoResponse {
    let service = FieldService::new(state.db.clone());

    match service.create_field(session.id, input).await {
        Ok(field) => {
            count_activity(&state, session.id, SessionStat::Fields).await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message(field, "Field created successfully")),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_field(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FieldService::new(state.db.clone());

    match service.get_field(field_id).await {
        Ok(field) => (StatusCode::OK, Json(ApiResponse::data(field))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Partially update a field
pub async fn update_field(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
    AppJson(input): AppJson<UpdateFieldInput>,
) -> impl IntoResponse {
    let service = FieldService::new(state.db.clone());

    match service.update_field(field_id, input).await {
        Ok(field) => (
            StatusCode::OK,
            Json(ApiResponse::with_message(field, "Field updated successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Soft delete a field
pub async fn delete_field(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FieldService::new(state.db.clone());

    match service.delete_field(field_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::message("Field deleted successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
