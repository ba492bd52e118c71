//! Error handling for the crop cycle server
//!
//! Every failure leaves the API as `{ "error": { "code", "message", ... } }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use shared::prediction::PredictionError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Prediction errors
    #[error("Crop type '{crop}' not recognized")]
    CropNotRecognized {
        crop: String,
        recognized: Vec<String>,
    },

    #[error("Prediction failed for stage '{stage}': {reason}")]
    PredictionFailed { stage: String, reason: String },

    #[error("Crop cycle models are not loaded")]
    ModelsUnavailable,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("BAD_REQUEST", msg.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::CropNotRecognized { crop, recognized } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some("crop_type".to_string()),
                    details: Some(json!({ "recognized_crops": recognized })),
                    ..ErrorDetail::new(
                        "CROP_NOT_RECOGNIZED",
                        format!(
                            "Crop type '{}' not recognized. Available crops: {}",
                            crop,
                            recognized.join(", ")
                        ),
                    )
                },
            ),
            AppError::PredictionFailed { stage, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    details: Some(json!({ "stage": stage })),
                    ..ErrorDetail::new(
                        "PREDICTION_FAILED",
                        format!("Prediction failed for stage '{}'", stage),
                    )
                },
            ),
            AppError::ModelsUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "MODELS_UNAVAILABLE",
                    "Crop cycle models are not available. Please check server logs.",
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::CropNotRecognized { crop, recognized } => {
                AppError::CropNotRecognized { crop, recognized }
            }
            PredictionError::PredictionFailed { stage, reason } => {
                AppError::PredictionFailed { stage, reason }
            }
            err @ PredictionError::DateOutOfRange { .. } => {
                AppError::validation("sowing_date", err.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.errors().iter().collect();
        fields.sort_by_key(|(name, _)| **name);

        let Some((field, kind)) = fields.first() else {
            return AppError::BadRequest("Invalid request".to_string());
        };

        let message = match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} failed {} check", field, e.code),
            }),
            _ => None,
        };

        AppError::Validation {
            field: field.to_string(),
            message: message.unwrap_or_else(|| format!("{} is invalid", field)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 0.0, max = 100.0))]
        humidity: f64,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::validation("area", "Area must be greater than 0"), StatusCode::BAD_REQUEST),
            (AppError::NotFound("Field".to_string()), StatusCode::NOT_FOUND),
            (AppError::ModelsUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::PredictionFailed {
                    stage: "Flowering".to_string(),
                    reason: "non-finite".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Internal("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_crop_not_recognized_lists_crops() {
        let error = AppError::from(PredictionError::CropNotRecognized {
            crop: "Unicorn".to_string(),
            recognized: vec!["Maize".to_string(), "Rice".to_string()],
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CROP_NOT_RECOGNIZED");
        assert_eq!(body["error"]["details"]["recognized_crops"], json!(["Maize", "Rice"]));
        assert!(body["error"]["message"].as_str().unwrap().contains("Maize, Rice"));
    }

    #[tokio::test]
    async fn test_prediction_failed_names_stage() {
        let error = AppError::from(PredictionError::PredictionFailed {
            stage: "Vegetative".to_string(),
            reason: "regressor returned NaN".to_string(),
        });
        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"]["code"], "PREDICTION_FAILED");
        assert_eq!(body["error"]["details"]["stage"], "Vegetative");
    }

    #[test]
    fn test_validation_errors_name_field() {
        let errors = Probe { humidity: 140.0 }.validate().unwrap_err();
        match AppError::from(errors) {
            AppError::Validation { field, .. } => assert_eq!(field, "humidity"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
