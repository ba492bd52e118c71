//! Yield prediction HTTP handlers

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
use crate::services::yield_prediction::{
    CreateYieldPredictionInput, RecordActualInput, YieldPredictionService,
};
use crate::AppState;

/// List the caller's yield predictions
pub async fn list_yield_predictions(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
) -> impl IntoResponse {
    let service = YieldPredictionService::new(state.db.clone());

    match service.list_predictions(session.id).await {
        Ok(predictions) => (StatusCode::OK, Json(ApiResponse::data(predictions))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Estimate the yield of a crop lifecycle
pub async fn create_yield_prediction(
    State(state): State<AppState>,
    ClientSession(session): ClientSession,
    AppJson(input): AppJson<CreateYieldPredictionInput>,
) -> impl IntoResponse {
    let service = YieldPredictionService::new(state.db.clone());

    match service.create_prediction(session.id, input).await {
        Ok(prediction) => {
            count_activity(&state, session.id, SessionStat::Predictions).await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message(prediction, "Yield prediction created successfully")),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_yield_prediction(
    State(state): State<AppState>,
    Path(prediction_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = YieldPredictionService::new(state.db.clone());

    match service.get_prediction(prediction_id).await {
        Ok(prediction) => (StatusCode::OK, Json(ApiResponse::data(prediction))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record the actual harvest of a prediction
pub async fn record_actual_yield(
    State(state): State<AppState>,
    Path(prediction_id): Path<Uuid>,
    AppJson(input): AppJson<RecordActualInput>,
) -> impl IntoResponse {
    let service = YieldPredictionService::new(state.db.clone());

    match service.record_actual(prediction_id, input).await {
        Ok(prediction) => (
            StatusCode::OK,
            Json(ApiResponse::with_message(prediction, "Actual yield recorded successfully")),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
