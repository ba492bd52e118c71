//! Mapped field models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Measured soil properties of a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SoilParameters {
    #[validate(range(min = 0.0))]
    pub nitrogen: Option<f64>,
    #[validate(range(min = 0.0))]
    pub phosphorus: Option<f64>,
    #[validate(range(min = 0.0))]
    pub potassium: Option<f64>,
    #[validate(range(min = 0.0, max = 14.0))]
    pub ph: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub organic_matter: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture: Option<f64>,
}

impl SoilParameters {
    /// Overlay the values present in `update`, keeping the rest
    pub fn merge(&mut self, update: &SoilParameters) {
        merge_opt(&mut self.nitrogen, update.nitrogen);
        merge_opt(&mut self.phosphorus, update.phosphorus);
        merge_opt(&mut self.potassium, update.potassium);
        merge_opt(&mut self.ph, update.ph);
        merge_opt(&mut self.organic_matter, update.organic_matter);
        merge_opt(&mut self.moisture, update.moisture);
    }
}

/// Long-run climate of a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct FieldWeather {
    #[validate(range(min = -60.0, max = 60.0))]
    pub average_temperature: Option<f64>,
    #[validate(range(min = 0.0, max = 20000.0))]
    pub annual_rainfall: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f64>,
}

impl FieldWeather {
    pub fn merge(&mut self, update: &FieldWeather) {
        merge_opt(&mut self.average_temperature, update.average_temperature);
        merge_opt(&mut self.annual_rainfall, update.annual_rainfall);
        merge_opt(&mut self.humidity, update.humidity);
    }
}

fn merge_opt(slot: &mut Option<f64>, value: Option<f64>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Fields are soft-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Active,
    Deleted,
}

impl FieldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldStatus::Active => "active",
            FieldStatus::Deleted => "deleted",
        }
    }
}
