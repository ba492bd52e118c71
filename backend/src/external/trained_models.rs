//! Loader for the trained crop-cycle models
//!
//! A model directory holds:
//!
//! - `feature_columns.json`: ordered feature-column names
//! - `stages.json`: growth stages in phenological order
//! - `duration_<Stage>_model.json` and `irrigation_<Stage>_model.json` per stage
//!
//! Loading is all-or-nothing; a partially valid directory yields an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use shared::prediction::{
    CropCyclePredictor, FeatureSchema, ModelSetError, Regressor, RegressorArtifact, RegressorError,
    StageModels,
};
use thiserror::Error;

pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";
pub const STAGES_FILE: &str = "stages.json";

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} lists no feature columns")]
    NoFeatureColumns(PathBuf),

    #[error("{path} was trained on different feature columns than feature_columns.json")]
    SchemaMismatch { path: PathBuf },

    #[error("{path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: RegressorError,
    },

    #[error(transparent)]
    InconsistentStages(#[from] ModelSetError),
}

pub fn duration_model_file(stage: &str) -> String {
    format!("duration_{}_model.json", stage)
}

pub fn irrigation_model_file(stage: &str) -> String {
    format!("irrigation_{}_model.json", stage)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ModelLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_artifact(path: &Path, schema: &FeatureSchema) -> Result<RegressorArtifact, ModelLoadError> {
    let artifact: RegressorArtifact = read_json(path)?;

    if let Some(names) = artifact.feature_names() {
        if names != schema.columns() {
            return Err(ModelLoadError::SchemaMismatch {
                path: path.to_path_buf(),
            });
        }
    }
    artifact.validate().map_err(|source| ModelLoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(artifact)
}

/// Load and cross-check every artifact in `dir`
pub fn load(dir: &Path) -> Result<CropCyclePredictor, ModelLoadError> {
    let columns_path = dir.join(FEATURE_COLUMNS_FILE);
    let schema: FeatureSchema = read_json(&columns_path)?;
    if schema.is_empty() {
        return Err(ModelLoadError::NoFeatureColumns(columns_path));
    }

    let stages: Vec<String> = read_json(&dir.join(STAGES_FILE))?;

    let mut duration: HashMap<String, Box<dyn Regressor>> = HashMap::new();
    let mut irrigation: HashMap<String, Box<dyn Regressor>> = HashMap::new();
    for stage in &stages {
        let model = load_artifact(&dir.join(duration_model_file(stage)), &schema)?;
        duration.insert(stage.clone(), Box::new(model));

        let model = load_artifact(&dir.join(irrigation_model_file(stage)), &schema)?;
        irrigation.insert(stage.clone(), Box::new(model));
    }

    let models = StageModels::new(stages, duration, irrigation)?;
    Ok(CropCyclePredictor::new(schema, models))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::models::{SoilSample, WeatherSample};
    use tempfile::TempDir;

    const COLUMNS: [&str; 5] = ["Year", "Sow_Month", "Temp_C", "Crop_Rice", "Crop_Wheat"];

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn linear(intercept: f64) -> serde_json::Value {
        json!({
            "kind": "linear",
            "feature_names": COLUMNS,
            "coefficients": [0.0, 0.0, 0.0, 1.0, 0.0],
            "intercept": intercept,
        })
    }

    fn model_dir(stages: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), FEATURE_COLUMNS_FILE, json!(COLUMNS));
        write(dir.path(), STAGES_FILE, json!(stages));
        for (i, stage) in stages.iter().enumerate() {
            write(dir.path(), &duration_model_file(stage), linear(10.0 * (i + 1) as f64));
            write(dir.path(), &irrigation_model_file(stage), linear(20.0));
        }
        dir
    }

    #[test]
    fn test_load_and_predict() {
        let dir = model_dir(&["Germination", "Vegetative"]);
        let predictor = load(dir.path()).unwrap();

        assert_eq!(predictor.stages(), &["Germination", "Vegetative"]);
        assert_eq!(predictor.recognized_crops(), vec!["Rice", "Wheat"]);

        let weather = WeatherSample {
            temperature_c: 25.0,
            rainfall_mm: 80.0,
            humidity_pct: 65.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let prediction = predictor
            .predict("Rice", date, &weather, &SoilSample::with_moisture(25.0))
            .unwrap();

        // Crop_Rice contributes +1 to every model
        assert_eq!(prediction.timeline[0].duration_days, 11);
        assert_eq!(prediction.timeline[1].duration_days, 21);
        assert_eq!(prediction.timeline[0].irrigation_rate_lphw, 21.0);
        assert_eq!(prediction.total_duration, 32);
    }

    #[test]
    fn test_stage_order_comes_from_stage_list() {
        let dir = model_dir(&["Maturity", "Germination"]);
        let predictor = load(dir.path()).unwrap();
        assert_eq!(predictor.stages(), &["Maturity", "Germination"]);
    }

    #[test]
    fn test_missing_model_file() {
        let dir = model_dir(&["Germination"]);
        std::fs::remove_file(dir.path().join(irrigation_model_file("Germination"))).unwrap();

        assert!(matches!(load(dir.path()), Err(ModelLoadError::Io { .. })));
    }

    #[test]
    fn test_schema_mismatch() {
        let dir = model_dir(&["Germination"]);
        write(
            dir.path(),
            &duration_model_file("Germination"),
            json!({
                "kind": "linear",
                "feature_names": ["Year", "Crop_Rice"],
                "coefficients": [0.0, 1.0],
                "intercept": 1.0,
            }),
        );

        assert!(matches!(load(dir.path()), Err(ModelLoadError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_duplicate_stage() {
        let dir = model_dir(&["Germination", "Germination"]);
        assert!(matches!(
            load(dir.path()),
            Err(ModelLoadError::InconsistentStages(ModelSetError::DuplicateStage(_)))
        ));
    }

    #[test]
    fn test_empty_stage_list() {
        let dir = model_dir(&[]);
        assert!(matches!(
            load(dir.path()),
            Err(ModelLoadError::InconsistentStages(ModelSetError::NoStages))
        ));
    }

    #[test]
    fn test_garbage_json() {
        let dir = model_dir(&["Germination"]);
        std::fs::write(dir.path().join(STAGES_FILE), "not json").unwrap();
        assert!(matches!(load(dir.path()), Err(ModelLoadError::Parse { .. })));
    }

    #[test]
    fn test_malformed_forest() {
        let dir = model_dir(&["Germination"]);
        write(
            dir.path(),
            &irrigation_model_file("Germination"),
            json!({ "kind": "forest", "feature_names": COLUMNS, "trees": [] }),
        );
        assert!(matches!(load(dir.path()), Err(ModelLoadError::Malformed { .. })));
    }

    #[test]
    fn test_bundled_models_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("trained_models");
        let predictor = load(&dir).unwrap();

        assert_eq!(
            predictor.stages(),
            &["Germination", "Vegetative", "Flowering", "Maturity"]
        );
        assert_eq!(
            predictor.recognized_crops(),
            vec!["Chickpea", "Cotton", "Maize", "Rice", "Wheat"]
        );

        let weather = WeatherSample {
            temperature_c: 28.0,
            rainfall_mm: 70.0,
            humidity_pct: 70.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let prediction = predictor
            .predict("Rice", date, &weather, &SoilSample::with_moisture(25.0))
            .unwrap();

        assert_eq!(prediction.timeline.len(), 4);
        let total: u64 = prediction.timeline.iter().map(|s| u64::from(s.duration_days)).sum();
        assert_eq!(prediction.total_duration, total);
        assert!(prediction.timeline.iter().all(|s| s.irrigation_rate_lphw >= 0.1));
    }

    #[test]
    fn test_bundled_models_refuse_runaway_cycle() {
        use shared::prediction::{PredictionError, MAX_CYCLE_DAYS};

        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("trained_models");
        let predictor = load(&dir).unwrap();

        // Vegetative duration grows with rainfall; a billion mm would be ten million days
        let weather = WeatherSample {
            temperature_c: 28.0,
            rainfall_mm: 1.0e9,
            humidity_pct: 70.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let err = predictor
            .predict("Rice", date, &weather, &SoilSample::with_moisture(25.0))
            .unwrap_err();

        match err {
            PredictionError::DateOutOfRange { start, days } => {
                assert_eq!(start, date);
                assert!(days > MAX_CYCLE_DAYS);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
