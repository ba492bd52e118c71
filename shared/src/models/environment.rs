//! Weather and soil conditions fed into a crop-cycle prediction

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Weather at sowing time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeatherSample {
    #[validate(range(min = -60.0, max = 60.0))]
    pub temperature_c: f64,
    #[validate(range(min = 0.0, max = 5000.0))]
    pub rainfall_mm: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity_pct: f64,
}

/// Soil at sowing time; only moisture feeds the trained models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SoilSample {
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_pct: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub phosphorus: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub potassium: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 14.0))]
    pub ph: Option<f64>,
}

impl SoilSample {
    pub fn with_moisture(moisture_pct: f64) -> Self {
        Self {
            moisture_pct,
            nitrogen: None,
            phosphorus: None,
            potassium: None,
            ph: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_validation() {
        let ok = WeatherSample {
            temperature_c: 28.0,
            rainfall_mm: 70.0,
            humidity_pct: 70.0,
        };
        assert!(ok.validate().is_ok());

        let bad = WeatherSample {
            humidity_pct: 120.0,
            ..ok.clone()
        };
        assert!(bad.validate().is_err());

        let flood = WeatherSample {
            rainfall_mm: 1.0e9,
            ..ok
        };
        assert!(flood.validate().is_err());
    }

    #[test]
    fn test_soil_nutrients_are_optional() {
        let soil: SoilSample = serde_json::from_str(r#"{"moisture_pct": 25.5}"#).unwrap();
        assert_eq!(soil, SoilSample::with_moisture(25.5));
        assert!(soil.validate().is_ok());

        let acidic = SoilSample {
            ph: Some(15.0),
            ..soil
        };
        assert!(acidic.validate().is_err());
    }
}
