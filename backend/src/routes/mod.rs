//! Route definitions for the crop cycle API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::api_status))
        .route("/session", get(handlers::get_session))
        .nest("/fields", field_routes())
        .nest("/crops", crop_routes())
        .nest("/yield-predictions", yield_prediction_routes())
}

/// Field mapping routes
fn field_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_fields).post(handlers::create_field))
        .route(
            "/:field_id",
            get(handlers::get_field)
                .put(handlers::update_field)
                .delete(handlers::delete_field),
        )
}

/// Crop lifecycle routes
fn crop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lifecycles).post(handlers::create_lifecycle))
        .route("/field/:field_id", get(handlers::list_field_lifecycles))
        .route("/:crop_id", get(handlers::get_lifecycle))
        .route("/:crop_id/stage", post(handlers::record_stage_update))
        .route("/:crop_id/irrigation", post(handlers::add_irrigation_record))
        .route("/:crop_id/fertilizer", post(handlers::add_fertilizer_record))
}

/// Yield prediction routes
fn yield_prediction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_yield_predictions).post(handlers::create_yield_prediction),
        )
        .route("/:prediction_id", get(handlers::get_yield_prediction))
        .route("/:prediction_id/actual", post(handlers::record_actual_yield))
}
