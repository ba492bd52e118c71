//! Crop-cycle prediction
//!
//! Turns a crop type, a sowing date and environmental conditions into a
//! growth-stage timeline and a weekly irrigation schedule:
//!
//! 1. [`encode`] builds the feature vector the trained models expect
//! 2. [`estimate`] asks every stage's regressors for a duration and a rate
//! 3. [`build`] places the stages on the calendar
//! 4. [`schedule`] splits each stage into weekly irrigation buckets
//!
//! Everything here is synchronous and free of side effects. Loaded models are
//! only ever read, so one [`CropCyclePredictor`] can serve concurrent requests.

mod environment;
mod estimator;
mod features;
mod irrigation;
mod regressor;
mod report;
mod timeline;

pub use environment::*;
pub use estimator::*;
pub use features::*;
pub use irrigation::*;
pub use regressor::*;
pub use report::*;
pub use timeline::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{SoilSample, WeatherSample};

/// Domain failures of a prediction
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictionError {
    #[error("crop type '{crop}' not recognized; available crops: {}", recognized.join(", "))]
    CropNotRecognized {
        crop: String,
        recognized: Vec<String>,
    },

    #[error("prediction failed for stage '{stage}': {reason}")]
    PredictionFailed { stage: String, reason: String },

    #[error("{days} days after {start} is outside the supported calendar")]
    DateOutOfRange { start: NaiveDate, days: u64 },
}

/// Full result of a crop-cycle prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCyclePrediction {
    pub crop: String,
    pub sow_date: NaiveDate,
    pub harvest_date: NaiveDate,
    pub total_duration: u64,
    pub timeline: Vec<TimelineStage>,
    pub irrigation_schedule: Vec<IrrigationScheduleEntry>,
}

impl CropCyclePrediction {
    /// Sum of the per-stage weekly irrigation rates
    pub fn total_irrigation_lphw(&self) -> f64 {
        self.timeline.iter().map(|s| s.irrigation_rate_lphw).sum()
    }

    /// Stage the crop is in on `date`, if inside the cycle
    pub fn stage_on(&self, date: NaiveDate) -> Option<&TimelineStage> {
        self.timeline
            .iter()
            .find(|s| s.start_date <= date && date < s.end_date)
    }
}

/// Predict a crop cycle from explicit schema and models
pub fn predict(
    crop_type: &str,
    sow_date: NaiveDate,
    weather: &WeatherSample,
    soil: &SoilSample,
    schema: &FeatureSchema,
    models: &StageModels,
) -> Result<CropCyclePrediction, PredictionError> {
    let features = encode(crop_type, sow_date, weather, soil, schema)?;
    let estimates = estimate(&features, models)?;
    let timeline = build(sow_date, &estimates)?;
    let irrigation_schedule = schedule(sow_date, &estimates)?;

    Ok(CropCyclePrediction {
        crop: crop_type.to_string(),
        sow_date,
        harvest_date: timeline.harvest_date,
        total_duration: timeline.total_days,
        timeline: timeline.stages,
        irrigation_schedule,
    })
}

/// Feature schema and stage models loaded together at startup
#[derive(Debug)]
pub struct CropCyclePredictor {
    schema: FeatureSchema,
    models: StageModels,
}

impl CropCyclePredictor {
    pub fn new(schema: FeatureSchema, models: StageModels) -> Self {
        Self { schema, models }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn stages(&self) -> &[String] {
        self.models.stages()
    }

    pub fn recognized_crops(&self) -> Vec<String> {
        self.schema.crop_names()
    }

    pub fn predict(
        &self,
        crop_type: &str,
        sow_date: NaiveDate,
        weather: &WeatherSample,
        soil: &SoilSample,
    ) -> Result<CropCyclePrediction, PredictionError> {
        predict(crop_type, sow_date, weather, soil, &self.schema, &self.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn predictor(durations: &[(&str, f64)], rate: f64) -> CropCyclePredictor {
        let schema = FeatureSchema::new(
            ["Year", "Sow_Month", "Temp_C", "Crop_Maize", "Crop_Rice"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let mut duration: HashMap<String, Box<dyn Regressor>> = HashMap::new();
        let mut irrigation: HashMap<String, Box<dyn Regressor>> = HashMap::new();
        for (stage, days) in durations {
            duration.insert(stage.to_string(), Box::new(RegressorArtifact::Constant { value: *days }));
            irrigation.insert(stage.to_string(), Box::new(RegressorArtifact::Constant { value: rate }));
        }
        let stages = durations.iter().map(|(s, _)| s.to_string()).collect();
        CropCyclePredictor::new(schema, StageModels::new(stages, duration, irrigation).unwrap())
    }

    fn inputs() -> (WeatherSample, SoilSample) {
        (
            WeatherSample {
                temperature_c: 28.0,
                rainfall_mm: 70.0,
                humidity_pct: 70.0,
            },
            SoilSample::with_moisture(25.0),
        )
    }

    #[test]
    fn test_predict_follows_stage_list_order() {
        let p = predictor(&[("Maturity", 30.0), ("Germination", 15.0)], 14.0);
        let (weather, soil) = inputs();
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let result = p.predict("Maize", date, &weather, &soil).unwrap();

        let names: Vec<_> = result.timeline.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(names, vec!["Maturity", "Germination"]);
        assert_eq!(result.total_duration, 45);
        assert_eq!(result.total_irrigation_lphw(), 28.0);
    }

    #[test]
    fn test_stage_on() {
        let p = predictor(&[("Germination", 10.0), ("Vegetative", 10.0)], 5.0);
        let (weather, soil) = inputs();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let result = p.predict("Rice", date, &weather, &soil).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        assert_eq!(result.stage_on(day(1)).unwrap().stage, "Germination");
        assert_eq!(result.stage_on(day(11)).unwrap().stage, "Vegetative");
        assert!(result.stage_on(day(21)).is_none());
    }

    #[test]
    fn test_unknown_crop_lists_recognized() {
        let p = predictor(&[("Germination", 10.0)], 5.0);
        let (weather, soil) = inputs();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err = p.predict("Unicorn", date, &weather, &soil).unwrap_err();

        assert_eq!(
            err.to_string(),
            "crop type 'Unicorn' not recognized; available crops: Maize, Rice"
        );
    }
}
