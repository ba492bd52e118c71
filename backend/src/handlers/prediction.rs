//! Crop-cycle prediction handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::middleware::AppJson;
use crate::services::prediction::PredictCropCycleInput;
use crate::AppState;

/// Predict growth stages and weekly irrigation for a crop sown on a date
pub async fn predict_crop_cycle(
    State(state): State<AppState>,
    AppJson(input): AppJson<PredictCropCycleInput>,
) -> impl IntoResponse {
    let service = state.prediction_service();

    match service.predict_crop_cycle(input) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}
