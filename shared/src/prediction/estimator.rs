//! Per-stage duration and irrigation estimation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FeatureVector, PredictionError, Regressor};

/// Durations are never shorter than one day
pub const MIN_DURATION_DAYS: u32 = 1;

/// Irrigation recommendations are never below 0.1 lphw
pub const MIN_IRRIGATION_LPHW: f64 = 0.1;

/// Inconsistent model sets rejected at load time
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelSetError {
    #[error("no growth stages configured")]
    NoStages,

    #[error("growth stage '{0}' listed more than once")]
    DuplicateStage(String),

    #[error("missing {kind} model for stage '{stage}'")]
    MissingModel { kind: &'static str, stage: String },

    #[error("{kind} model for unknown stage '{stage}'")]
    UnexpectedModel { kind: &'static str, stage: String },
}

/// Duration and irrigation regressors for every growth stage, in phenological order
pub struct StageModels {
    stages: Vec<String>,
    duration: HashMap<String, Box<dyn Regressor>>,
    irrigation: HashMap<String, Box<dyn Regressor>>,
}

impl std::fmt::Debug for StageModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageModels")
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

impl StageModels {
    /// Build a model set; both maps must be keyed by exactly the listed stages
    pub fn new(
        stages: Vec<String>,
        duration: HashMap<String, Box<dyn Regressor>>,
        irrigation: HashMap<String, Box<dyn Regressor>>,
    ) -> Result<Self, ModelSetError> {
        if stages.is_empty() {
            return Err(ModelSetError::NoStages);
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(ModelSetError::DuplicateStage(stage.clone()));
            }
        }

        for (kind, models) in [("duration", &duration), ("irrigation", &irrigation)] {
            if let Some(stage) = stages.iter().find(|s| !models.contains_key(*s)) {
                return Err(ModelSetError::MissingModel {
                    kind,
                    stage: stage.clone(),
                });
            }
            if let Some(stage) = models.keys().find(|k| !stages.contains(*k)) {
                return Err(ModelSetError::UnexpectedModel {
                    kind,
                    stage: stage.clone(),
                });
            }
        }

        Ok(Self {
            stages,
            duration,
            irrigation,
        })
    }

    /// Stage names in sequencing order
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    fn models_for(&self, stage: &str) -> (&dyn Regressor, &dyn Regressor) {
        // Presence of both entries is guaranteed by `new`.
        (
            self.duration[stage].as_ref(),
            self.irrigation[stage].as_ref(),
        )
    }
}

/// Predicted duration and irrigation rate for one growth stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEstimate {
    pub stage: String,
    pub duration_days: u32,
    /// Liters per hectare per week
    pub irrigation_rate_lphw: f64,
}

/// Truncate a raw duration prediction toward zero and clamp it to at least one day
pub fn clamp_duration(raw: f64) -> u32 {
    // `as` saturates out-of-range floats, matching an integer cast.
    let days = raw.trunc() as i64;
    days.clamp(i64::from(MIN_DURATION_DAYS), i64::from(u32::MAX)) as u32
}

/// Clamp a raw irrigation prediction to the minimum recommendation
pub fn clamp_irrigation(raw: f64) -> f64 {
    raw.max(MIN_IRRIGATION_LPHW)
}

/// Ask every stage's regressors for a duration and an irrigation rate
pub fn estimate(
    features: &FeatureVector,
    models: &StageModels,
) -> Result<Vec<StageEstimate>, PredictionError> {
    models
        .stages()
        .iter()
        .map(|stage| {
            let (duration_model, irrigation_model) = models.models_for(stage);
            let raw_duration = run(stage, duration_model, features)?;
            let raw_irrigation = run(stage, irrigation_model, features)?;

            Ok(StageEstimate {
                stage: stage.clone(),
                duration_days: clamp_duration(raw_duration),
                irrigation_rate_lphw: clamp_irrigation(raw_irrigation),
            })
        })
        .collect()
}

fn run(
    stage: &str,
    model: &dyn Regressor,
    features: &FeatureVector,
) -> Result<f64, PredictionError> {
    let value = model
        .predict(features)
        .map_err(|e| PredictionError::PredictionFailed {
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;

    if !value.is_finite() {
        return Err(PredictionError::PredictionFailed {
            stage: stage.to_string(),
            reason: format!("non-finite prediction {}", value),
        });
    }
    Ok(value)
}
