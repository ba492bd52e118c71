//! Crop-cycle prediction service

use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use shared::models::{SoilSample, SowingParameters, WeatherSample};
use shared::prediction::{
    CropCyclePrediction, CropCyclePredictor, CropCycleReport, EnvironmentSource,
    SyntheticEnvironment,
};
use shared::validation::{validate_date, validate_name};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Prediction service over the models loaded at startup
#[derive(Clone)]
pub struct PredictionService {
    predictor: Option<Arc<CropCyclePredictor>>,
    synthetic_seed: Option<u64>,
}

/// Body of `POST /predict-crop-cycle`
#[derive(Debug, Deserialize)]
pub struct PredictCropCycleInput {
    pub crop_type: String,
    pub sowing_date: String,
    pub weather: Option<WeatherSample>,
    pub soil: Option<SoilSample>,
}

/// Conditions the prediction actually ran with
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedData {
    pub weather: WeatherSample,
    pub soil: SoilSample,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropCyclePredictionResponse {
    #[serde(flatten)]
    pub report: CropCycleReport,
    pub generated_data: GeneratedData,
}

impl PredictionService {
    pub fn new(predictor: Option<Arc<CropCyclePredictor>>, synthetic_seed: Option<u64>) -> Self {
        Self {
            predictor,
            synthetic_seed,
        }
    }

    pub fn is_available(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn predictor(&self) -> AppResult<&CropCyclePredictor> {
        self.predictor.as_deref().ok_or(AppError::ModelsUnavailable)
    }

    fn environment(&self) -> SyntheticEnvironment<StdRng> {
        SyntheticEnvironment::from_seed(self.synthetic_seed.unwrap_or_else(rand::random))
    }

    /// Predict a full crop cycle, drawing any missing conditions synthetically
    pub fn predict_crop_cycle(
        &self,
        input: PredictCropCycleInput,
    ) -> AppResult<CropCyclePredictionResponse> {
        validate_name(&input.crop_type).map_err(|msg| AppError::validation("crop_type", msg))?;
        let sow_date = validate_date(&input.sowing_date)
            .map_err(|msg| AppError::validation("sowing_date", msg))?;
        if let Some(weather) = &input.weather {
            weather.validate()?;
        }
        if let Some(soil) = &input.soil {
            soil.validate()?;
        }

        let predictor = self.predictor()?;

        let mut environment = self.environment();
        let weather = input
            .weather
            .unwrap_or_else(|| environment.weather(sow_date));
        let soil = input.soil.unwrap_or_else(|| environment.soil());

        let prediction = predictor.predict(input.crop_type.trim(), sow_date, &weather, &soil)?;

        tracing::info!(
            "Predicted {} cycle from {}: {} days",
            prediction.crop,
            input.sowing_date,
            prediction.total_duration
        );

        Ok(CropCyclePredictionResponse {
            report: CropCycleReport::from(&prediction),
            generated_data: GeneratedData { weather, soil },
        })
    }

    /// Forecast for a new lifecycle from whatever sowing conditions were recorded
    pub fn forecast(
        &self,
        crop_name: &str,
        sow_date: NaiveDate,
        params: &SowingParameters,
    ) -> AppResult<CropCyclePrediction> {
        let predictor = self.predictor()?;

        let mut environment = self.environment();
        let weather = params.weather_or(environment.weather(sow_date));
        let soil = params.soil_or(environment.soil());

        Ok(predictor.predict(crop_name, sow_date, &weather, &soil)?)
    }
}
