//! Trained regressors consumed by the stage estimator
//!
//! Estimators are opaque to the rest of the core: anything implementing
//! [`Regressor`] can stand in for a trained model. [`RegressorArtifact`] is the
//! on-disk JSON form produced by the training pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FeatureVector;

/// Failures raised while evaluating a regressor
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegressorError {
    #[error("feature schema mismatch: model expects {expected} columns, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("feature column {index} is '{actual}', model expects '{expected}'")]
    ColumnMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("malformed model: {0}")]
    MalformedModel(String),
}

/// A trained estimator mapping a feature vector to a single real number
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError> {
        (**self).predict(features)
    }
}

/// Serialized regressor as written by the training pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    /// Ordinary least squares style model: `intercept + Σ coefᵢ·xᵢ`
    Linear {
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Random forest regression: mean of the tree outputs
    Forest {
        feature_names: Vec<String>,
        trees: Vec<DecisionTree>,
    },
    /// Always predicts the same value
    Constant { value: f64 },
}

/// A regression tree stored as a flat node list rooted at index 0
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} splits on unknown feature {}", i, feature));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!("node {} has a dangling child", i));
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, values: &[f64]) -> Result<f64, RegressorError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = values.get(*feature).ok_or_else(|| {
                        RegressorError::MalformedModel(format!(
                            "split on feature {} outside vector of length {}",
                            feature,
                            values.len()
                        ))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(RegressorError::MalformedModel(format!(
                        "node index {} out of bounds",
                        idx
                    )))
                }
            }
        }
        Err(RegressorError::MalformedModel(
            "tree does not terminate in a leaf".to_string(),
        ))
    }
}

impl RegressorArtifact {
    /// Feature names the artifact was trained on; `None` for constants
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            RegressorArtifact::Linear { feature_names, .. }
            | RegressorArtifact::Forest { feature_names, .. } => Some(feature_names),
            RegressorArtifact::Constant { .. } => None,
        }
    }

    /// Structural checks that do not need a feature vector
    pub fn validate(&self) -> Result<(), RegressorError> {
        match self {
            RegressorArtifact::Linear {
                feature_names,
                coefficients,
                ..
            } if coefficients.len() != feature_names.len() => Err(RegressorError::MalformedModel(
                format!(
                    "{} coefficients for {} features",
                    coefficients.len(),
                    feature_names.len()
                ),
            )),
            RegressorArtifact::Forest { trees, .. } if trees.is_empty() => Err(
                RegressorError::MalformedModel("forest has no trees".to_string()),
            ),
            RegressorArtifact::Forest {
                feature_names,
                trees,
            } => {
                for (t, tree) in trees.iter().enumerate() {
                    tree.validate(feature_names.len())
                        .map_err(|e| RegressorError::MalformedModel(format!("tree {}: {}", t, e)))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_columns(expected: &[String], features: &FeatureVector) -> Result<(), RegressorError> {
        if expected.len() != features.len() {
            return Err(RegressorError::SchemaMismatch {
                expected: expected.len(),
                actual: features.len(),
            });
        }
        for (index, (want, got)) in expected.iter().zip(features.columns()).enumerate() {
            if want != got {
                return Err(RegressorError::ColumnMismatch {
                    index,
                    expected: want.clone(),
                    actual: got.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Regressor for RegressorArtifact {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError> {
        match self {
            RegressorArtifact::Linear {
                feature_names,
                coefficients,
                intercept,
            } => {
                Self::check_columns(feature_names, features)?;
                if coefficients.len() != feature_names.len() {
                    return Err(RegressorError::MalformedModel(format!(
                        "{} coefficients for {} features",
                        coefficients.len(),
                        feature_names.len()
                    )));
                }
                let dot: f64 = coefficients
                    .iter()
                    .zip(features.values())
                    .map(|(c, x)| c * x)
                    .sum();
                Ok(intercept + dot)
            }
            RegressorArtifact::Forest {
                feature_names,
                trees,
            } => {
                Self::check_columns(feature_names, features)?;
                if trees.is_empty() {
                    return Err(RegressorError::MalformedModel(
                        "forest has no trees".to_string(),
                    ));
                }
                let mut total = 0.0;
                for tree in trees {
                    total += tree.evaluate(features.values())?;
                }
                Ok(total / trees.len() as f64)
            }
            RegressorArtifact::Constant { value } => Ok(*value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SoilSample, WeatherSample};
    use crate::prediction::{encode, FeatureSchema};
    use chrono::NaiveDate;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn vector(cols: &[&str]) -> FeatureVector {
        let weather = WeatherSample {
            temperature_c: 30.0,
            rainfall_mm: 100.0,
            humidity_pct: 60.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        encode(
            "Rice",
            date,
            &weather,
            &SoilSample::with_moisture(20.0),
            &FeatureSchema::new(names(cols)),
        )
        .unwrap()
    }

    #[test]
    fn test_linear_prediction() {
        let model = RegressorArtifact::Linear {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            coefficients: vec![0.5, 10.0],
            intercept: 2.0,
        };
        let v = vector(&["Temp_C", "Crop_Rice"]);
        assert_eq!(model.predict(&v).unwrap(), 2.0 + 15.0 + 10.0);
    }

    #[test]
    fn test_linear_rejects_reordered_columns() {
        let model = RegressorArtifact::Linear {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            coefficients: vec![0.5, 10.0],
            intercept: 2.0,
        };
        let v = vector(&["Crop_Rice", "Temp_C"]);
        assert!(matches!(
            model.predict(&v),
            Err(RegressorError::ColumnMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_forest_averages_trees() {
        let split = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 25.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 10.0 },
                TreeNode::Leaf { value: 20.0 },
            ],
        };
        let stump = DecisionTree {
            nodes: vec![TreeNode::Leaf { value: 30.0 }],
        };
        let model = RegressorArtifact::Forest {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            trees: vec![split, stump],
        };
        // Temp_C = 30 goes right (20), averaged with 30
        assert_eq!(model.predict(&vector(&["Temp_C", "Crop_Rice"])).unwrap(), 25.0);
    }

    #[test]
    fn test_forest_detects_cycles() {
        let looping = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        };
        let model = RegressorArtifact::Forest {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            trees: vec![looping],
        };
        assert!(matches!(
            model.predict(&vector(&["Temp_C", "Crop_Rice"])),
            Err(RegressorError::MalformedModel(_))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let model = RegressorArtifact::Linear {
            feature_names: names(&["Temp_C"]),
            coefficients: vec![1.0],
            intercept: 0.0,
        };
        assert_eq!(
            model.predict(&vector(&["Temp_C", "Crop_Rice"])),
            Err(RegressorError::SchemaMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_artifact_json_format() {
        let json = r#"{
            "kind": "forest",
            "feature_names": ["Temp_C"],
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 20.0, "left": 1, "right": 2},
                {"value": 1.5},
                {"value": 3.5}
            ]}]
        }"#;
        let model: RegressorArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(model.feature_names().unwrap(), &["Temp_C".to_string()]);
    }
    #[test]
    fn test_validate_rejects_dangling_child() {
        let model = RegressorArtifact::Forest {
            feature_names: names(&["Temp_C"]),
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 5,
                }],
            }],
        };
        assert!(matches!(model.validate(), Err(RegressorError::MalformedModel(_))));

        let wrong_feature = RegressorArtifact::Forest {
            feature_names: names(&["Temp_C"]),
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 3,
                        threshold: 1.0,
                        left: 1,
                        right: 1,
                    },
                    TreeNode::Leaf { value: 1.0 },
                ],
            }],
        };
        assert!(wrong_feature.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let linear = RegressorArtifact::Linear {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            coefficients: vec![1.0, 2.0],
            intercept: 0.0,
        };
        assert!(linear.validate().is_ok());
        assert!(RegressorArtifact::Constant { value: 3.0 }.validate().is_ok());

        let short = RegressorArtifact::Linear {
            feature_names: names(&["Temp_C", "Crop_Rice"]),
            coefficients: vec![1.0],
            intercept: 0.0,
        };
        assert!(short.validate().is_err());
    }
}
