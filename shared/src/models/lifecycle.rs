//! Crop lifecycle models: sowing conditions, stage progress, irrigation and
//! fertilizer history

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{SoilSample, WeatherSample};

/// Stage recorded for a freshly sown crop
pub const INITIAL_STAGE: &str = "seeded";

pub const DEFAULT_IRRIGATION_METHOD: &str = "manual";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Completed,
    Failed,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Active => "active",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Failed => "failed",
        }
    }
}

/// Conditions at sowing, as far as the grower supplied them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SowingParameters {
    #[validate(range(min = 0.0))]
    pub nitrogen: Option<f64>,
    #[validate(range(min = 0.0))]
    pub phosphorus: Option<f64>,
    #[validate(range(min = 0.0))]
    pub potassium: Option<f64>,
    #[validate(range(min = 0.0, max = 14.0))]
    pub ph: Option<f64>,
    #[validate(range(min = -60.0, max = 60.0))]
    pub temperature: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f64>,
    #[validate(range(min = 0.0, max = 5000.0))]
    pub rainfall: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub soil_moisture: Option<f64>,
}

impl SowingParameters {
    /// Supplied weather values, with gaps filled from `fallback`
    pub fn weather_or(&self, fallback: WeatherSample) -> WeatherSample {
        WeatherSample {
            temperature_c: self.temperature.unwrap_or(fallback.temperature_c),
            rainfall_mm: self.rainfall.unwrap_or(fallback.rainfall_mm),
            humidity_pct: self.humidity.unwrap_or(fallback.humidity_pct),
        }
    }

    /// Supplied soil values, with gaps filled from `fallback`
    pub fn soil_or(&self, fallback: SoilSample) -> SoilSample {
        SoilSample {
            moisture_pct: self.soil_moisture.unwrap_or(fallback.moisture_pct),
            nitrogen: self.nitrogen.or(fallback.nitrogen),
            phosphorus: self.phosphorus.or(fallback.phosphorus),
            potassium: self.potassium.or(fallback.potassium),
            ph: self.ph.or(fallback.ph),
        }
    }
}

/// Nutrient delivered by a fertilizer application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutrientType {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
    #[serde(rename = "compound")]
    Compound,
}

impl NutrientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientType::Nitrogen => "N",
            NutrientType::Phosphorus => "P",
            NutrientType::Potassium => "K",
            NutrientType::Compound => "compound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMethod {
    Basal,
    TopDress,
    Foliar,
}

impl ApplicationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationMethod::Basal => "basal",
            ApplicationMethod::TopDress => "top_dress",
            ApplicationMethod::Foliar => "foliar",
        }
    }
}

/// Running kg/ha totals of single-nutrient applications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub nitrogen: Decimal,
    pub phosphorus: Decimal,
    pub potassium: Decimal,
}

impl NutrientTotals {
    /// Compound fertilizers carry no declared split and are not counted
    pub fn apply(&mut self, nutrient: NutrientType, amount_kg_per_ha: Decimal) {
        match nutrient {
            NutrientType::Nitrogen => self.nitrogen += amount_kg_per_ha,
            NutrientType::Phosphorus => self.phosphorus += amount_kg_per_ha,
            NutrientType::Potassium => self.potassium += amount_kg_per_ha,
            NutrientType::Compound => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_values_win_over_fallback() {
        let params = SowingParameters {
            temperature: Some(31.0),
            soil_moisture: Some(18.0),
            ..Default::default()
        };
        let fallback = WeatherSample {
            temperature_c: 25.0,
            rainfall_mm: 80.0,
            humidity_pct: 65.0,
        };

        let weather = params.weather_or(fallback);
        assert_eq!(weather.temperature_c, 31.0);
        assert_eq!(weather.rainfall_mm, 80.0);
        assert_eq!(weather.humidity_pct, 65.0);

        let soil = params.soil_or(SoilSample::with_moisture(27.0));
        assert_eq!(soil.moisture_pct, 18.0);
        assert_eq!(soil.nitrogen, None);
    }

    #[test]
    fn test_nutrient_totals() {
        let mut totals = NutrientTotals::default();
        totals.apply(NutrientType::Nitrogen, Decimal::new(125, 1));
        totals.apply(NutrientType::Nitrogen, Decimal::new(75, 1));
        totals.apply(NutrientType::Potassium, Decimal::from(10));
        totals.apply(NutrientType::Compound, Decimal::from(50));

        assert_eq!(totals.nitrogen, Decimal::from(20));
        assert_eq!(totals.phosphorus, Decimal::ZERO);
        assert_eq!(totals.potassium, Decimal::from(10));
    }

    #[test]
    fn test_nutrient_wire_names() {
        let parsed: NutrientType = serde_json::from_str(r#""N""#).unwrap();
        assert_eq!(parsed, NutrientType::Nitrogen);
        let parsed: NutrientType = serde_json::from_str(r#""compound""#).unwrap();
        assert_eq!(parsed, NutrientType::Compound);
        let method: ApplicationMethod = serde_json::from_str(r#""top_dress""#).unwrap();
        assert_eq!(method.as_str(), "top_dress");
    }
}
