//! Growth-stage timeline built from stage estimates

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{PredictionError, StageEstimate};

/// One growth stage placed on the calendar; `end_date` is exclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStage {
    pub stage: String,
    pub duration_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub irrigation_rate_lphw: f64,
}

/// Contiguous sequence of stages from sowing to harvest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub stages: Vec<TimelineStage>,
    pub harvest_date: NaiveDate,
    pub total_days: u64,
}

/// Longest crop cycle a prediction may span, about ten years
pub const MAX_CYCLE_DAYS: u64 = 3650;

/// Last year that still prints as `YYYY-MM-DD`
pub const MAX_YEAR: i32 = 9999;

/// Calendar-day addition that fails past year 9999 instead of overflowing
pub(crate) fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, PredictionError> {
    date.checked_add_days(Days::new(days))
        .filter(|end| end.year() <= MAX_YEAR)
        .ok_or(PredictionError::DateOutOfRange { start: date, days })
}

/// Reject estimates whose stages add up to more than [`MAX_CYCLE_DAYS`]
pub(crate) fn check_cycle_length(
    sow_date: NaiveDate,
    estimates: &[StageEstimate],
) -> Result<u64, PredictionError> {
    let total_days: u64 = estimates.iter().map(|e| u64::from(e.duration_days)).sum();
    if total_days > MAX_CYCLE_DAYS {
        return Err(PredictionError::DateOutOfRange {
            start: sow_date,
            days: total_days,
        });
    }
    Ok(total_days)
}

/// Sequence the stages from the sowing date in estimator order
pub fn build(sow_date: NaiveDate, estimates: &[StageEstimate]) -> Result<Timeline, PredictionError> {
    let total_days = check_cycle_length(sow_date, estimates)?;

    let mut stages = Vec::with_capacity(estimates.len());
    let mut current = sow_date;

    for estimate in estimates {
        let end = add_days(current, u64::from(estimate.duration_days))?;
        stages.push(TimelineStage {
            stage: estimate.stage.clone(),
            duration_days: estimate.duration_days,
            start_date: current,
            end_date: end,
            irrigation_rate_lphw: estimate.irrigation_rate_lphw,
        });
        current = end;
    }

    let harvest_date = add_days(sow_date, total_days)?;

    Ok(Timeline {
        stages,
        harvest_date,
        total_days,
    })
}
