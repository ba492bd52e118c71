//! Anonymous per-client session bookkeeping

use serde::{Deserialize, Serialize};

/// Per-session activity counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStat {
    Fields,
    Crops,
    Predictions,
}

impl SessionStat {
    /// Counter column incremented for this activity
    pub fn column(&self) -> &'static str {
        match self {
            SessionStat::Fields => "fields_count",
            SessionStat::Crops => "crops_count",
            SessionStat::Predictions => "predictions_count",
        }
    }
}
