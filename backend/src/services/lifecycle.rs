//! Crop lifecycle service: sowing, stage progress, irrigation and fertilizer

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use shared::models::{
    ApplicationMethod, LifecycleStatus, NutrientTotals, NutrientType, SowingParameters,
    DEFAULT_IRRIGATION_METHOD, INITIAL_STAGE,
};
use shared::prediction::{CropCyclePrediction, CropCycleReport, IrrigationWeekReport, TimelineStageReport};
use shared::validation::{validate_amount, validate_date, validate_name};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::field::FieldService;
use super::prediction::PredictionService;
use crate::error::{AppError, AppResult};

const LIFECYCLE_COLUMNS: &str = "id, session_id, field_id, crop_name, crop_variety, sowing_date, \
    expected_harvest_date, actual_harvest_date, sowing_parameters, growth_stages, \
    irrigation_schedule, total_predicted_irrigation, irrigation_method, total_water_used, \
    total_nitrogen, total_phosphorus, total_potassium, current_stage, status, created_at, updated_at";

/// Crop lifecycle service
#[derive(Clone)]
pub struct CropLifecycleService {
    db: PgPool,
    prediction: PredictionService,
}

/// A crop grown on a field, from sowing to harvest
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CropLifecycle {
    pub id: Uuid,
    pub session_id: Uuid,
    pub field_id: Uuid,
    pub crop_name: String,
    pub crop_variety: Option<String>,
    pub sowing_date: NaiveDate,
    pub expected_harvest_date: Option<NaiveDate>,
    pub actual_harvest_date: Option<NaiveDate>,
    pub sowing_parameters: Json<SowingParameters>,
    pub growth_stages: Json<Vec<TimelineStageReport>>,
    pub irrigation_schedule: Json<Vec<IrrigationWeekReport>>,
    pub total_predicted_irrigation: Option<Decimal>,
    pub irrigation_method: String,
    pub total_water_used: Decimal,
    pub total_nitrogen: Decimal,
    pub total_phosphorus: Decimal,
    pub total_potassium: Decimal,
    pub current_stage: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CropStageUpdate {
    pub id: Uuid,
    pub crop_lifecycle_id: Uuid,
    pub stage_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i32>,
    pub kc_value: Option<Decimal>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IrrigationRecord {
    pub id: Uuid,
    pub crop_lifecycle_id: Uuid,
    pub applied_on: NaiveDate,
    pub amount_mm: Decimal,
    pub method: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FertilizerRecord {
    pub id: Uuid,
    pub crop_lifecycle_id: Uuid,
    pub applied_on: NaiveDate,
    pub nutrient_type: String,
    pub amount_kg_per_ha: Decimal,
    pub application_method: String,
    pub fertilizer_name: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Lifecycle together with its recorded history
#[derive(Debug, Serialize)]
pub struct CropLifecycleDetail {
    #[serde(flatten)]
    pub lifecycle: CropLifecycle,
    pub stage_updates: Vec<CropStageUpdate>,
    pub irrigation_records: Vec<IrrigationRecord>,
    pub fertilizer_records: Vec<FertilizerRecord>,
}

/// Input for sowing a crop; sowing conditions sit at the top level of the body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLifecycleInput {
    pub field_id: Uuid,
    pub crop_name: String,
    pub crop_variety: Option<String>,
    pub sowing_date: String,
    pub irrigation_method: Option<String>,
    #[serde(flatten)]
    #[validate]
    pub sowing_parameters: SowingParameters,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StageUpdateInput {
    #[validate(length(min = 1, max = 50))]
    pub stage_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[validate(range(min = 0))]
    pub duration_days: Option<i32>,
    pub kc_value: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IrrigationRecordInput {
    pub applied_on: String,
    pub amount_mm: Decimal,
    pub method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FertilizerRecordInput {
    pub applied_on: String,
    pub nutrient_type: NutrientType,
    pub amount_kg_per_ha: Decimal,
    pub application_method: ApplicationMethod,
    pub fertilizer_name: Option<String>,
    pub notes: Option<String>,
}

/// Stored form of a forecast
struct StoredForecast {
    expected_harvest_date: NaiveDate,
    growth_stages: Vec<TimelineStageReport>,
    irrigation_schedule: Vec<IrrigationWeekReport>,
    total_predicted_irrigation: Option<Decimal>,
}

impl From<&CropCyclePrediction> for StoredForecast {
    fn from(prediction: &CropCyclePrediction) -> Self {
        let report = CropCycleReport::from(prediction);
        Self {
            expected_harvest_date: prediction.harvest_date,
            growth_stages: report.timeline,
            irrigation_schedule: report.irrigation_schedule,
            total_predicted_irrigation: Decimal::from_f64(prediction.total_irrigation_lphw())
                .map(|d| d.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)),
        }
    }
}

fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    validate_date(value).map_err(|msg| AppError::validation(field, msg))
}

fn parse_optional_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value.map(|v| parse_date(field, v)).transpose()
}

/// Duration of a stage when only its bounds were reported
fn stage_duration(start: NaiveDate, end: Option<NaiveDate>, reported: Option<i32>) -> AppResult<Option<i32>> {
    match end {
        Some(end) if end < start => Err(AppError::validation(
            "end_date",
            "Stage end date cannot be before its start date",
        )),
        Some(end) => Ok(reported.or_else(|| i32::try_from((end - start).num_days()).ok())),
        None => Ok(reported),
    }
}

impl CropLifecycleService {
    pub fn new(db: PgPool, prediction: PredictionService) -> Self {
        Self { db, prediction }
    }

    /// Sow a crop on a field and forecast its cycle when models are loaded
    pub async fn create_lifecycle(
        &self,
        session_id: Uuid,
        input: CreateLifecycleInput,
    ) -> AppResult<CropLifecycle> {
        validate_name(&input.crop_name).map_err(|msg| AppError::validation("crop_name", msg))?;
        let sowing_date = parse_date("sowing_date", &input.sowing_date)?;
        input.validate()?;

        let field = FieldService::new(self.db.clone()).get_field(input.field_id).await?;
        let crop_name = input.crop_name.trim();

        let forecast = match self
            .prediction
            .forecast(crop_name, sowing_date, &input.sowing_parameters)
        {
            Ok(prediction) => Some(StoredForecast::from(&prediction)),
            Err(AppError::ModelsUnavailable) => None,
            Err(e) => {
                tracing::warn!("Forecast for {} on field {} failed: {}", crop_name, field.id, e);
                None
            }
        };

        let (expected_harvest_date, growth_stages, irrigation_schedule, total_predicted_irrigation) =
            match forecast {
                Some(f) => (
                    Some(f.expected_harvest_date),
                    f.growth_stages,
                    f.irrigation_schedule,
                    f.total_predicted_irrigation,
                ),
                None => (None, Vec::new(), Vec::new(), None),
            };

        let lifecycle = sqlx::query_as::<_, CropLifecycle>(&format!(
            r#"
            INSERT INTO crop_lifecycles (session_id, field_id, crop_name, crop_variety, sowing_date,
                                         expected_harvest_date, sowing_parameters, growth_stages,
                                         irrigation_schedule, total_predicted_irrigation,
                                         irrigation_method, current_stage, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {LIFECYCLE_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(field.id)
        .bind(crop_name)
        .bind(&input.crop_variety)
        .bind(sowing_date)
        .bind(expected_harvest_date)
        .bind(Json(&input.sowing_parameters))
        .bind(Json(&growth_stages))
        .bind(Json(&irrigation_schedule))
        .bind(total_predicted_irrigation)
        .bind(input.irrigation_method.as_deref().unwrap_or(DEFAULT_IRRIGATION_METHOD))
        .bind(INITIAL_STAGE)
        .bind(LifecycleStatus::Active.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Created {} lifecycle {} on field {}",
            lifecycle.crop_name,
            lifecycle.id,
            lifecycle.field_id
        );

        Ok(lifecycle)
    }

    /// Lifecycles of a session, newest first
    pub async fn list_lifecycles(&self, session_id: Uuid) -> AppResult<Vec<CropLifecycle>> {
        let lifecycles = sqlx::query_as::<_, CropLifecycle>(&format!(
            "SELECT {LIFECYCLE_COLUMNS} FROM crop_lifecycles WHERE session_id = $1 ORDER BY created_at DESC"
        ))
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lifecycles)
    }

    /// Lifecycles of a field, latest sowing first
    pub async fn list_for_field(&self, field_id: Uuid) -> AppResult<Vec<CropLifecycle>> {
        let lifecycles = sqlx::query_as::<_, CropLifecycle>(&format!(
            "SELECT {LIFECYCLE_COLUMNS} FROM crop_lifecycles WHERE field_id = $1 ORDER BY sowing_date DESC"
        ))
        .bind(field_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lifecycles)
    }

    pub async fn get_lifecycle(&self, lifecycle_id: Uuid) -> AppResult<CropLifecycle> {
        sqlx::query_as::<_, CropLifecycle>(&format!(
            "SELECT {LIFECYCLE_COLUMNS} FROM crop_lifecycles WHERE id = $1"
        ))
        .bind(lifecycle_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crop lifecycle".to_string()))
    }

    /// Lifecycle with its stage, irrigation and fertilizer history
    pub async fn get_lifecycle_detail(&self, lifecycle_id: Uuid) -> AppResult<CropLifecycleDetail> {
        let lifecycle = self.get_lifecycle(lifecycle_id).await?;

        let stage_updates = sqlx::query_as::<_, CropStageUpdate>(
            r#"
            SELECT id, crop_lifecycle_id, stage_name, start_date, end_date, duration_days,
                   kc_value, notes, updated_at
            FROM crop_stage_updates
            WHERE crop_lifecycle_id = $1
            ORDER BY start_date, updated_at
            "#,
        )
        .bind(lifecycle_id)
        .fetch_all(&self.db)
        .await?;

        let irrigation_records = sqlx::query_as::<_, IrrigationRecord>(
            r#"
            SELECT id, crop_lifecycle_id, applied_on, amount_mm, method, notes, recorded_at
            FROM irrigation_records
            WHERE crop_lifecycle_id = $1
            ORDER BY applied_on DESC, recorded_at DESC
            "#,
        )
        .bind(lifecycle_id)
        .fetch_all(&self.db)
        .await?;

        let fertilizer_records = sqlx::query_as::<_, FertilizerRecord>(
            r#"
            SELECT id, crop_lifecycle_id, applied_on, nutrient_type, amount_kg_per_ha,
                   application_method, fertilizer_name, notes, recorded_at
            FROM fertilizer_records
            WHERE crop_lifecycle_id = $1
            ORDER BY applied_on DESC, recorded_at DESC
            "#,
        )
        .bind(lifecycle_id)
        .fetch_all(&self.db)
        .await?;

        Ok(CropLifecycleDetail {
            lifecycle,
            stage_updates,
            irrigation_records,
            fertilizer_records,
        })
    }

    /// Record that the crop entered a new stage
    pub async fn record_stage_update(
        &self,
        lifecycle_id: Uuid,
        input: StageUpdateInput,
    ) -> AppResult<CropStageUpdate> {
        input.validate()?;
        let start_date = parse_optional_date("start_date", input.start_date.as_deref())?
            .unwrap_or_else(|| Utc::now().date_naive());
        let end_date = parse_optional_date("end_date", input.end_date.as_deref())?;
        let duration_days = stage_duration(start_date, end_date, input.duration_days)?;

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE crop_lifecycles SET current_stage = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&input.stage_name)
        .bind(lifecycle_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Crop lifecycle".to_string()));
        }

        let update = sqlx::query_as::<_, CropStageUpdate>(
            r#"
            INSERT INTO crop_stage_updates (crop_lifecycle_id, stage_name, start_date, end_date,
                                            duration_days, kc_value, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, crop_lifecycle_id, stage_name, start_date, end_date, duration_days,
                      kc_value, notes, updated_at
            "#,
        )
        .bind(lifecycle_id)
        .bind(&input.stage_name)
        .bind(start_date)
        .bind(end_date)
        .bind(duration_days)
        .bind(input.kc_value)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Lifecycle {} entered stage '{}'", lifecycle_id, update.stage_name);

        Ok(update)
    }

    /// Record an irrigation and add it to the water used so far
    pub async fn add_irrigation_record(
        &self,
        lifecycle_id: Uuid,
        input: IrrigationRecordInput,
    ) -> AppResult<IrrigationRecord> {
        let applied_on = parse_date("applied_on", &input.applied_on)?;
        validate_amount(input.amount_mm).map_err(|msg| AppError::validation("amount_mm", msg))?;

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE crop_lifecycles
            SET total_water_used = total_water_used + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(input.amount_mm)
        .bind(lifecycle_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Crop lifecycle".to_string()));
        }

        let record = sqlx::query_as::<_, IrrigationRecord>(
            r#"
            INSERT INTO irrigation_records (crop_lifecycle_id, applied_on, amount_mm, method, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, crop_lifecycle_id, applied_on, amount_mm, method, notes, recorded_at
            "#,
        )
        .bind(lifecycle_id)
        .bind(applied_on)
        .bind(input.amount_mm)
        .bind(input.method.as_deref().unwrap_or(DEFAULT_IRRIGATION_METHOD))
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Recorded {} mm irrigation for lifecycle {}", record.amount_mm, lifecycle_id);

        Ok(record)
    }

    /// Record a fertilizer application and update the nutrient totals
    pub async fn add_fertilizer_record(
        &self,
        lifecycle_id: Uuid,
        input: FertilizerRecordInput,
    ) -> AppResult<FertilizerRecord> {
        let applied_on = parse_date("applied_on", &input.applied_on)?;
        validate_amount(input.amount_kg_per_ha)
            .map_err(|msg| AppError::validation("amount_kg_per_ha", msg))?;

        let mut tx = self.db.begin().await?;

        let current: Option<(Decimal, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT total_nitrogen, total_phosphorus, total_potassium
            FROM crop_lifecycles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(lifecycle_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (nitrogen, phosphorus, potassium) =
            current.ok_or_else(|| AppError::NotFound("Crop lifecycle".to_string()))?;
        let mut totals = NutrientTotals {
            nitrogen,
            phosphorus,
            potassium,
        };
        totals.apply(input.nutrient_type, input.amount_kg_per_ha);

        sqlx::query(
            r#"
            UPDATE crop_lifecycles
            SET total_nitrogen = $1, total_phosphorus = $2, total_potassium = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(totals.nitrogen)
        .bind(totals.phosphorus)
        .bind(totals.potassium)
        .bind(lifecycle_id)
        .execute(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, FertilizerRecord>(
            r#"
            INSERT INTO fertilizer_records (crop_lifecycle_id, applied_on, nutrient_type,
                                            amount_kg_per_ha, application_method,
                                            fertilizer_name, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, crop_lifecycle_id, applied_on, nutrient_type, amount_kg_per_ha,
                      application_method, fertilizer_name, notes, recorded_at
            "#,
        )
        .bind(lifecycle_id)
        .bind(applied_on)
        .bind(input.nutrient_type.as_str())
        .bind(input.amount_kg_per_ha)
        .bind(input.application_method.as_str())
        .bind(&input.fertilizer_name)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Recorded {} kg/ha {} for lifecycle {}",
            record.amount_kg_per_ha,
            record.nutrient_type,
            lifecycle_id
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::prediction::{IrrigationScheduleEntry, TimelineStage};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_create_input_flattens_sowing_conditions() {
        let input: CreateLifecycleInput = serde_json::from_str(
            r#"{
                "field_id": "6f1c7a3e-2b4d-4c59-9a0e-1d2f3b4c5d6e",
                "crop_name": "Rice",
                "sowing_date": "2025-10-01",
                "temperature": 29.0,
                "soil_moisture": 31.5
            }"#,
        )
        .unwrap();

        assert_eq!(input.sowing_parameters.temperature, Some(29.0));
        assert_eq!(input.sowing_parameters.soil_moisture, Some(31.5));
        assert_eq!(input.sowing_parameters.rainfall, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_input_range_checks() {
        let input: CreateLifecycleInput = serde_json::from_str(
            r#"{
                "field_id": "6f1c7a3e-2b4d-4c59-9a0e-1d2f3b4c5d6e",
                "crop_name": "Rice",
                "sowing_date": "2025-10-01",
                "humidity": 140.0
            }"#,
        )
        .unwrap();

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_stage_duration() {
        assert_eq!(stage_duration(day(3, 1), Some(day(3, 21)), None).unwrap(), Some(20));
        assert_eq!(stage_duration(day(3, 1), Some(day(3, 21)), Some(18)).unwrap(), Some(18));
        assert_eq!(stage_duration(day(3, 1), None, None).unwrap(), None);
        assert!(stage_duration(day(3, 21), Some(day(3, 1)), None).is_err());
    }

    #[test]
    fn test_stored_forecast() {
        let prediction = CropCyclePrediction {
            crop: "Rice".to_string(),
            sow_date: day(10, 1),
            harvest_date: day(10, 11),
            total_duration: 10,
            timeline: vec![TimelineStage {
                stage: "Germination".to_string(),
                duration_days: 10,
                start_date: day(10, 1),
                end_date: day(10, 11),
                irrigation_rate_lphw: 12.5,
            }],
            irrigation_schedule: vec![
                IrrigationScheduleEntry {
                    stage: "Germination".to_string(),
                    week_start: day(10, 1),
                    week_end: day(10, 8),
                    irrigation_need_lphw: 12.5,
                },
                IrrigationScheduleEntry {
                    stage: "Germination".to_string(),
                    week_start: day(10, 8),
                    week_end: day(10, 11),
                    irrigation_need_lphw: 12.5 * 3.0 / 7.0,
                },
            ],
        };

        let stored = StoredForecast::from(&prediction);
        assert_eq!(stored.expected_harvest_date, day(10, 11));
        assert_eq!(stored.growth_stages[0].irrigation_need, "12.50 lphw");
        assert_eq!(stored.irrigation_schedule.len(), 2);
        assert_eq!(stored.total_predicted_irrigation, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn test_fertilizer_input_wire_names() {
        let input: FertilizerRecordInput = serde_json::from_str(
            r#"{"applied_on": "2025-11-02", "nutrient_type": "N", "amount_kg_per_ha": 12.5,
                "application_method": "top_dress"}"#,
        )
        .unwrap();

        assert_eq!(input.nutrient_type, NutrientType::Nitrogen);
        assert_eq!(input.application_method, ApplicationMethod::TopDress);
        assert_eq!(input.amount_kg_per_ha, Decimal::new(125, 1));
    }
}
