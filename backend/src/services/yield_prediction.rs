//! Yield prediction service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{
    accuracy_score, estimate_yield, YieldError, YieldInputs, YieldPredictionStatus,
};
use shared::validation::{
    validate_date, validate_harvest_after_sowing, validate_yield, validate_yield_inputs,
};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Newest-first page size of a session's yield predictions
pub const YIELD_LIST_LIMIT: i64 = 50;

pub const MODEL_VERSION: &str = "1.0";
pub const PREDICTION_METHOD: &str = "heuristic";

const YIELD_COLUMNS: &str = "id, session_id, field_id, crop_lifecycle_id, crop_name, \
    prediction_parameters, expected_yield_per_hectare, total_expected_yield, yield_quality_grade, \
    harvest_date_prediction, confidence_score, risk_factors, recommendations, model_version, \
    prediction_method, actual_yield, actual_harvest_date, quality_achieved, accuracy_score, status, \
    prediction_date, created_at, updated_at";

/// Yield prediction service
#[derive(Clone)]
pub struct YieldPredictionService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct YieldPrediction {
    pub id: Uuid,
    pub session_id: Uuid,
    pub field_id: Uuid,
    pub crop_lifecycle_id: Uuid,
    pub crop_name: String,
    pub prediction_parameters: Json<YieldInputs>,
    pub expected_yield_per_hectare: Decimal,
    pub total_expected_yield: Decimal,
    pub yield_quality_grade: String,
    pub harvest_date_prediction: Option<NaiveDate>,
    pub confidence_score: Decimal,
    pub risk_factors: Json<Vec<String>>,
    pub recommendations: Json<Vec<String>>,
    pub model_version: String,
    pub prediction_method: String,
    pub actual_yield: Option<Decimal>,
    pub actual_harvest_date: Option<NaiveDate>,
    pub quality_achieved: Option<String>,
    pub accuracy_score: Option<Decimal>,
    pub status: String,
    pub prediction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateYieldPredictionInput {
    pub field_id: Uuid,
    pub crop_lifecycle_id: Uuid,
    pub harvest_date_prediction: Option<String>,
    #[serde(flatten)]
    pub inputs: YieldInputs,
}

#[derive(Debug, Deserialize)]
pub struct RecordActualInput {
    pub actual_yield: Decimal,
    pub actual_harvest_date: String,
    pub quality_achieved: Option<String>,
}

/// Parts of a lifecycle a yield prediction depends on
#[derive(Debug, FromRow)]
struct LifecycleRef {
    sowing_date: NaiveDate,
    expected_harvest_date: Option<NaiveDate>,
    total_water_used: Decimal,
}

/// Check a new prediction's inputs and parse its optional harvest date
fn check_create_input(input: &CreateYieldPredictionInput) -> AppResult<Option<NaiveDate>> {
    validate_yield_inputs(&input.inputs).map_err(|(field, msg)| AppError::validation(field, msg))?;
    input
        .harvest_date_prediction
        .as_deref()
        .map(|d| validate_date(d).map_err(|msg| AppError::validation("harvest_date_prediction", msg)))
        .transpose()
}

impl YieldPredictionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Estimate the yield of a lifecycle and store the estimate
    pub async fn create_prediction(
        &self,
        session_id: Uuid,
        input: CreateYieldPredictionInput,
    ) -> AppResult<YieldPrediction> {
        let harvest_date = check_create_input(&input)?;

        let lifecycle = sqlx::query_as::<_, LifecycleRef>(
            r#"
            SELECT sowing_date, expected_harvest_date, total_water_used
            FROM crop_lifecycles
            WHERE id = $1 AND field_id = $2
            "#,
        )
        .bind(input.crop_lifecycle_id)
        .bind(input.field_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop lifecycle".to_string()))?;

        if let Some(date) = harvest_date {
            validate_harvest_after_sowing(lifecycle.sowing_date, date)
                .map_err(|msg| AppError::validation("harvest_date_prediction", msg))?;
        }

        let mut inputs = input.inputs;
        inputs.crop_name = inputs.crop_name.trim().to_string();
        if inputs.irrigation_total.is_none() {
            inputs.irrigation_total = Some(lifecycle.total_water_used);
        }

        let estimate = estimate_yield(&inputs).map_err(|e| match e {
            YieldError::Overflow { field } => AppError::validation(field, e.to_string()),
        })?;

        let prediction = sqlx::query_as::<_, YieldPrediction>(&format!(
            r#"
            INSERT INTO yield_predictions (session_id, field_id, crop_lifecycle_id, crop_name,
                                           prediction_parameters, expected_yield_per_hectare,
                                           total_expected_yield, yield_quality_grade,
                                           harvest_date_prediction, confidence_score,
                                           risk_factors, recommendations, model_version,
                                           prediction_method, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {YIELD_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(input.field_id)
        .bind(input.crop_lifecycle_id)
        .bind(&inputs.crop_name)
        .bind(Json(&inputs))
        .bind(estimate.expected_yield_per_hectare)
        .bind(estimate.total_expected_yield)
        .bind(estimate.quality_grade.as_str())
        .bind(harvest_date.or(lifecycle.expected_harvest_date))
        .bind(estimate.confidence_score)
        .bind(Json(&estimate.risk_factors))
        .bind(Json(&estimate.recommendations))
        .bind(MODEL_VERSION)
        .bind(PREDICTION_METHOD)
        .bind(YieldPredictionStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Created yield prediction {} for lifecycle {}: {} t/ha",
            prediction.id,
            prediction.crop_lifecycle_id,
            prediction.expected_yield_per_hectare
        );

        Ok(prediction)
    }

    /// Yield predictions of a session, newest first
    pub async fn list_predictions(&self, session_id: Uuid) -> AppResult<Vec<YieldPrediction>> {
        let predictions = sqlx::query_as::<_, YieldPrediction>(&format!(
            r#"
            SELECT {YIELD_COLUMNS}
            FROM yield_predictions
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(session_id)
        .bind(YIELD_LIST_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(predictions)
    }

    pub async fn get_prediction(&self, prediction_id: Uuid) -> AppResult<YieldPrediction> {
        sqlx::query_as::<_, YieldPrediction>(&format!(
            "SELECT {YIELD_COLUMNS} FROM yield_predictions WHERE id = $1"
        ))
        .bind(prediction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Yield prediction".to_string()))
    }

    /// Record the harvest and score the prediction against it
    pub async fn record_actual(
        &self,
        prediction_id: Uuid,
        input: RecordActualInput,
    ) -> AppResult<YieldPrediction> {
        validate_yield(input.actual_yield).map_err(|msg| AppError::validation("actual_yield", msg))?;
        let harvest_date = validate_date(&input.actual_harvest_date)
            .map_err(|msg| AppError::validation("actual_harvest_date", msg))?;

        let existing = self.get_prediction(prediction_id).await?;

        let sowing_date: NaiveDate =
            sqlx::query_scalar("SELECT sowing_date FROM crop_lifecycles WHERE id = $1")
                .bind(existing.crop_lifecycle_id)
                .fetch_one(&self.db)
                .await?;
        validate_harvest_after_sowing(sowing_date, harvest_date)
            .map_err(|msg| AppError::validation("actual_harvest_date", msg))?;

        let accuracy = accuracy_score(existing.expected_yield_per_hectare, input.actual_yield);

        let prediction = sqlx::query_as::<_, YieldPrediction>(&format!(
            r#"
            UPDATE yield_predictions
            SET actual_yield = $1, actual_harvest_date = $2, quality_achieved = $3,
                accuracy_score = $4, status = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {YIELD_COLUMNS}
            "#
        ))
        .bind(input.actual_yield)
        .bind(harvest_date)
        .bind(&input.quality_achieved)
        .bind(accuracy)
        .bind(YieldPredictionStatus::Completed.as_str())
        .bind(prediction_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Yield prediction {} completed with accuracy {:?}",
            prediction.id,
            prediction.accuracy_score
        );

        Ok(prediction)
    }
}
