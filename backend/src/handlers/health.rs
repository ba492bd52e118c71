//! Health and status handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub models_loaded: bool,
    pub stages: Vec<String>,
    pub recognized_crops: Vec<String>,
}

/// Banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Crop Prediction API is running!",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Database connectivity and model availability
pub async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };

    let (stages, recognized_crops) = match &state.predictor {
        Some(predictor) => (predictor.stages().to_vec(), predictor.recognized_crops()),
        None => (Vec::new(), Vec::new()),
    };

    Json(StatusResponse {
        status: if state.predictor.is_some() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        models_loaded: state.predictor.is_some(),
        stages,
        recognized_crops,
    })
}
