//! Boundary presentation of a prediction
//!
//! Rates stay numeric inside the core; the `"12.34 lphw"` display strings are
//! only produced here.

use serde::{Deserialize, Serialize};

use super::CropCyclePrediction;
use crate::types::format_iso_date;

pub const IRRIGATION_UNIT: &str = "lphw";

/// Two-decimal rate with unit suffix, e.g. `"12.34 lphw"`
pub fn format_lphw(rate: f64) -> String {
    format!("{:.2} {}", rate, IRRIGATION_UNIT)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStageReport {
    pub stage: String,
    pub duration_days: u32,
    pub start: String,
    pub end: String,
    pub irrigation_need: String,
    pub irrigation_rate_lphw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationWeekReport {
    pub week_start: String,
    pub week_end: String,
    pub stage: String,
    pub irrigation_need: String,
    pub irrigation_rate_lphw: f64,
}

/// Crop-cycle prediction as returned to API and browser clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCycleReport {
    pub crop: String,
    pub sow_date: String,
    pub harvest_date: String,
    pub total_duration: u64,
    pub timeline: Vec<TimelineStageReport>,
    pub irrigation_schedule: Vec<IrrigationWeekReport>,
}

impl From<&CropCyclePrediction> for CropCycleReport {
    fn from(prediction: &CropCyclePrediction) -> Self {
        Self {
            crop: prediction.crop.clone(),
            sow_date: format_iso_date(prediction.sow_date),
            harvest_date: format_iso_date(prediction.harvest_date),
            total_duration: prediction.total_duration,
            timeline: prediction
                .timeline
                .iter()
                .map(|s| TimelineStageReport {
                    stage: s.stage.clone(),
                    duration_days: s.duration_days,
                    start: format_iso_date(s.start_date),
                    end: format_iso_date(s.end_date),
                    irrigation_need: format_lphw(s.irrigation_rate_lphw),
                    irrigation_rate_lphw: s.irrigation_rate_lphw,
                })
                .collect(),
            irrigation_schedule: prediction
                .irrigation_schedule
                .iter()
                .map(|w| IrrigationWeekReport {
                    week_start: format_iso_date(w.week_start),
                    week_end: format_iso_date(w.week_end),
                    stage: w.stage.clone(),
                    irrigation_need: format_lphw(w.irrigation_need_lphw),
                    irrigation_rate_lphw: w.irrigation_need_lphw,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{IrrigationScheduleEntry, TimelineStage};
    use chrono::NaiveDate;

    #[test]
    fn test_format_lphw() {
        assert_eq!(format_lphw(12.346), "12.35 lphw");
        assert_eq!(format_lphw(0.1), "0.10 lphw");
        assert_eq!(format_lphw(3.0), "3.00 lphw");
    }

    #[test]
    fn test_report_formats_dates_and_rates() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let prediction = CropCyclePrediction {
            crop: "Rice".to_string(),
            sow_date: d(10, 1),
            harvest_date: d(10, 3),
            total_duration: 2,
            timeline: vec![TimelineStage {
                stage: "Germination".to_string(),
                duration_days: 2,
                start_date: d(10, 1),
                end_date: d(10, 3),
                irrigation_rate_lphw: 7.0,
            }],
            irrigation_schedule: vec![IrrigationScheduleEntry {
                week_start: d(10, 1),
                week_end: d(10, 3),
                stage: "Germination".to_string(),
                irrigation_need_lphw: 2.0,
            }],
        };

        let report = CropCycleReport::from(&prediction);
        assert_eq!(report.sow_date, "2025-10-01");
        assert_eq!(report.harvest_date, "2025-10-03");
        assert_eq!(report.timeline[0].irrigation_need, "7.00 lphw");
        assert_eq!(report.timeline[0].irrigation_rate_lphw, 7.0);
        assert_eq!(report.irrigation_schedule[0].week_end, "2025-10-03");
        assert_eq!(report.irrigation_schedule[0].irrigation_need, "2.00 lphw");
    }
}
