//! Week-by-week irrigation schedule

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timeline::{add_days, check_cycle_length};
use super::{PredictionError, StageEstimate};

pub const DAYS_PER_WEEK: u64 = 7;

/// Irrigation for one bucket of at most a week inside a single stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationScheduleEntry {
    pub week_start: NaiveDate,
    /// Exclusive
    pub week_end: NaiveDate,
    pub stage: String,
    pub irrigation_need_lphw: f64,
}

impl IrrigationScheduleEntry {
    pub fn days(&self) -> i64 {
        (self.week_end - self.week_start).num_days()
    }
}

/// Scale a weekly rate to a bucket of `days` days
pub fn pro_rate(weekly_rate: f64, days: u64) -> f64 {
    weekly_rate * days.min(DAYS_PER_WEEK) as f64 / DAYS_PER_WEEK as f64
}

/// Split every stage into week-long buckets, the last one possibly shorter
pub fn schedule(
    sow_date: NaiveDate,
    estimates: &[StageEstimate],
) -> Result<Vec<IrrigationScheduleEntry>, PredictionError> {
    let total_days = check_cycle_length(sow_date, estimates)?;

    let weeks = total_days.div_ceil(DAYS_PER_WEEK) as usize;
    let mut entries = Vec::with_capacity(weeks + estimates.len());
    let mut stage_start = sow_date;

    for estimate in estimates {
        let stage_end = add_days(stage_start, u64::from(estimate.duration_days))?;

        let mut remaining = u64::from(estimate.duration_days);
        let mut week_start = stage_start;
        while week_start < stage_end {
            let days = remaining.min(DAYS_PER_WEEK);
            let week_end = add_days(week_start, days)?;

            entries.push(IrrigationScheduleEntry {
                week_start,
                week_end,
                stage: estimate.stage.clone(),
                irrigation_need_lphw: pro_rate(estimate.irrigation_rate_lphw, days),
            });

            remaining -= days;
            week_start = week_end;
        }

        stage_start = stage_end;
    }

    Ok(entries)
}
