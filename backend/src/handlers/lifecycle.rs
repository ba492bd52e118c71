//! Crop lifecycle HTTP handlers

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
use crate::services::lifecycle::{
    CreateLifecycleInput, FertilizerRecordInput, IrrigationRecordInput, StageUpdateInput,
};
use crate::AppState;

/// List the caller's crop lifecycles
pub async fn list_lifecycles(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.list_lifecycles(session.id).await {
        Ok(lifecycles) => (StatusCode::OK, Json(ApiResponse::data(lifecycles))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Sow a crop, with a predicted cycle when models are loaded
pub async fn create_lifecycle(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    AppJson(input): AppJson<CreateLifecycleInput>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.create_lifecycle(session.id, input).await {
        Ok(lifecycle) => {
            count_activity(&state, session.id, SessionStat::Crops).await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message(lifecycle, "Crop lifecycle created successfully")),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Get a lifecycle with its stage, irrigation and fertilizer history
pub async fn get_lifecycle(
    State(state): State<AppState>,
    Path(crop_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.get_lifecycle_detail(crop_id).await {
        Ok(detail) => (StatusCode::OK, Json(ApiResponse::data(detail))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_field_lifecycles(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.list_for_field(field_id).await {
        Ok(lifecycles) => (StatusCode::OK, Json(ApiResponse::data(lifecycles))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn record_stage_update(
    State(state): State<AppState>,
    Path(crop_id): Path<Uuid>,
    AppJson(input): AppJson<StageUpdateInput>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.record_stage_update(crop_id, input).await {
        Ok(update) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message(update, "Crop stage updated successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn add_irrigation_record(
    State(state): State<AppState>,
    Path(crop_id): Path<Uuid>,
    AppJson(input): AppJson<IrrigationRecordInput>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.add_irrigation_record(crop_id, input).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message(record, "Irrigation record added successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn add_fertilizer_record(
    State(state): State<AppState>,
    Path(crop_id): Path<Uuid>,
    AppJson(input): AppJson<FertilizerRecordInput>,
) -> impl IntoResponse {
    let service = state.lifecycle_service();

    match service.add_fertilizer_record(crop_id, input).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::with_message(record, "Fertilizer record added successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
