//! Feature encoding for the stage regressors
//!
//! The trained regressors are order-sensitive: the vector handed to them must
//! carry exactly the columns produced at training time, in the same order.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::PredictionError;
use crate::models::{SoilSample, WeatherSample};

/// Prefix of the one-hot crop indicator columns (`Crop_Rice`, `Crop_Maize`, ...)
pub const CROP_COLUMN_PREFIX: &str = "Crop_";

pub const COL_YEAR: &str = "Year";
pub const COL_SOW_MONTH: &str = "Sow_Month";
pub const COL_TEMPERATURE: &str = "Temp_C";
pub const COL_RAINFALL: &str = "Rainfall_mm";
pub const COL_HUMIDITY: &str = "Humidity_%";
pub const COL_SOIL_MOISTURE: &str = "SoilMoist_%";

/// Ordered list of feature-column names fixed at training time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Name of the indicator column for a crop (exact, case-sensitive)
    pub fn crop_column(crop_type: &str) -> String {
        format!("{}{}", CROP_COLUMN_PREFIX, crop_type)
    }

    /// Crops the schema can encode, in column order, without duplicates
    pub fn crop_names(&self) -> Vec<String> {
        let mut crops: Vec<String> = Vec::new();
        for column in &self.columns {
            if let Some(crop) = column.strip_prefix(CROP_COLUMN_PREFIX) {
                if !crop.is_empty() && !crops.iter().any(|c| c == crop) {
                    crops.push(crop.to_string());
                }
            }
        }
        crops
    }
}

/// A feature vector projected onto a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    /// Iterate over `(column, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Encode a prediction request into the vector the regressors were trained on.
///
/// Environmental columns missing from the schema are dropped; schema columns
/// that are not set here (every other crop indicator included) stay at 0.
pub fn encode(
    crop_type: &str,
    sow_date: NaiveDate,
    weather: &WeatherSample,
    soil: &SoilSample,
    schema: &FeatureSchema,
) -> Result<FeatureVector, PredictionError> {
    let crop_column = FeatureSchema::crop_column(crop_type);
    if !schema.contains(&crop_column) {
        return Err(PredictionError::CropNotRecognized {
            crop: crop_type.to_string(),
            recognized: schema.crop_names(),
        });
    }

    let base = [
        (COL_YEAR, f64::from(sow_date.year())),
        (COL_SOW_MONTH, f64::from(sow_date.month())),
        (COL_TEMPERATURE, weather.temperature_c),
        (COL_RAINFALL, weather.rainfall_mm),
        (COL_HUMIDITY, weather.humidity_pct),
        (COL_SOIL_MOISTURE, soil.moisture_pct),
    ];

    let values = schema
        .columns()
        .iter()
        .map(|column| {
            if *column == crop_column {
                1.0
            } else {
                base.iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| *value)
                    .unwrap_or(0.0)
            }
        })
        .collect();

    Ok(FeatureVector {
        columns: schema.columns().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            [
                "Year",
                "Sow_Month",
                "Temp_C",
                "Rainfall_mm",
                "Humidity_%",
                "SoilMoist_%",
                "Crop_Maize",
                "Crop_Rice",
                "Crop_Sweet_Potato",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }

    fn weather() -> WeatherSample {
        WeatherSample {
            temperature_c: 27.5,
            rainfall_mm: 500.0,
            humidity_pct: 70.0,
        }
    }

    fn soil() -> SoilSample {
        SoilSample::with_moisture(25.0)
    }

    #[test]
    fn test_encode_sets_base_record_and_indicator() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let vector = encode("Rice", date, &weather(), &soil(), &schema()).unwrap();

        assert_eq!(vector.columns(), schema().columns());
        assert_eq!(vector.get("Year"), Some(2026.0));
        assert_eq!(vector.get("Sow_Month"), Some(6.0));
        assert_eq!(vector.get("Temp_C"), Some(27.5));
        assert_eq!(vector.get("Rainfall_mm"), Some(500.0));
        assert_eq!(vector.get("Humidity_%"), Some(70.0));
        assert_eq!(vector.get("SoilMoist_%"), Some(25.0));
        assert_eq!(vector.get("Crop_Rice"), Some(1.0));
        assert_eq!(vector.get("Crop_Maize"), Some(0.0));
        assert_eq!(vector.get("Crop_Sweet_Potato"), Some(0.0));
    }

    #[test]
    fn test_encode_follows_schema_order() {
        let reordered = FeatureSchema::new(
            ["Crop_Rice", "SoilMoist_%", "Year"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let vector = encode("Rice", date, &weather(), &soil(), &reordered).unwrap();

        assert_eq!(vector.values(), &[1.0, 25.0, 2025.0]);
    }

    #[test]
    fn test_crop_match_is_case_sensitive() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let err = encode("rice", date, &weather(), &soil(), &schema()).unwrap_err();

        match err {
            PredictionError::CropNotRecognized { crop, recognized } => {
                assert_eq!(crop, "rice");
                assert_eq!(recognized, vec!["Maize", "Rice", "Sweet_Potato"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_crop_names_deduplicated() {
        let schema = FeatureSchema::new(vec![
            "Crop_Rice".to_string(),
            "Crop_Rice".to_string(),
            "Crop_".to_string(),
            "Year".to_string(),
        ]);
        assert_eq!(schema.crop_names(), vec!["Rice"]);
    }
}
