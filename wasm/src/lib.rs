//! WebAssembly module for the crop cycle client
//!
//! Provides client-side computation for:
//! - Re-planning a timeline and irrigation schedule from stage estimates
//! - Locating the current growth stage
//! - Yield estimation
//! - Input validation before submitting forms

use chrono::NaiveDate;
use shared::prediction::{
    build, clamp_duration, clamp_irrigation, format_lphw, schedule, CropCyclePrediction,
    CropCycleReport, Season, StageEstimate,
};
use shared::models::{estimate_yield, YieldInputs};
use shared::validation::{validate_date, validate_yield_inputs};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::types::*;

fn to_js_error(message: String) -> JsValue {
    web_sys::console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

/// Lay the given stage estimates out from `sow_date`.
///
/// Estimates edited on the client are clamped the same way model output is.
fn plan_cycle(crop: &str, sow_date: &str, estimates_json: &str) -> Result<CropCyclePrediction, String> {
    let sow_date = validate_date(sow_date).map_err(str::to_string)?;
    let estimates: Vec<StageEstimate> = serde_json::from_str(estimates_json)
        .map_err(|e| format!("Invalid stage estimates JSON: {}", e))?;
    if estimates.is_empty() {
        return Err("At least one stage estimate is required".to_string());
    }

    let estimates: Vec<StageEstimate> = estimates
        .into_iter()
        .map(|e| StageEstimate {
            duration_days: clamp_duration(f64::from(e.duration_days)),
            irrigation_rate_lphw: clamp_irrigation(e.irrigation_rate_lphw),
            ..e
        })
        .collect();

    let timeline = build(sow_date, &estimates).map_err(|e| e.to_string())?;
    let irrigation_schedule = schedule(sow_date, &estimates).map_err(|e| e.to_string())?;

    Ok(CropCyclePrediction {
        crop: crop.to_string(),
        sow_date,
        harvest_date: timeline.harvest_date,
        total_duration: timeline.total_days,
        timeline: timeline.stages,
        irrigation_schedule,
    })
}

fn crop_timeline_json(crop: &str, sow_date: &str, estimates_json: &str) -> Result<String, String> {
    let prediction = plan_cycle(crop, sow_date, estimates_json)?;
    serde_json::to_string(&CropCycleReport::from(&prediction)).map_err(|e| e.to_string())
}

fn stage_on(sow_date: &str, estimates_json: &str, date: NaiveDate) -> Result<Option<String>, String> {
    let prediction = plan_cycle("", sow_date, estimates_json)?;
    Ok(prediction.stage_on(date).map(|s| s.stage.clone()))
}

fn yield_estimate_json(inputs_json: &str) -> Result<String, String> {
    let inputs: YieldInputs =
        serde_json::from_str(inputs_json).map_err(|e| format!("Invalid yield inputs JSON: {}", e))?;
    validate_yield_inputs(&inputs).map_err(|(field, msg)| format!("{}: {}", field, msg))?;
    let estimate = estimate_yield(&inputs).map_err(|e| e.to_string())?;
    serde_json::to_string(&estimate).map_err(|e| e.to_string())
}

/// Timeline and weekly irrigation for `[{stage, duration_days, irrigation_rate_lphw}, ...]`
#[wasm_bindgen]
pub fn build_crop_timeline(crop: &str, sow_date: &str, estimates_json: &str) -> Result<String, JsValue> {
    crop_timeline_json(crop, sow_date, estimates_json).map_err(to_js_error)
}

/// Stage the crop is in today, or `undefined` outside the cycle
#[wasm_bindgen]
pub fn current_stage(sow_date: &str, estimates_json: &str) -> Result<Option<String>, JsValue> {
    let now = js_sys::Date::new_0();
    let today = NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .ok_or_else(|| to_js_error("Browser clock returned an invalid date".to_string()))?;

    stage_on(sow_date, estimates_json, today).map_err(to_js_error)
}

/// Heuristic yield estimate for a JSON-encoded set of yield inputs
#[wasm_bindgen]
pub fn estimate_crop_yield(inputs_json: &str) -> Result<String, JsValue> {
    yield_estimate_json(inputs_json).map_err(to_js_error)
}

fn season_name(month: u32) -> Result<String, String> {
    Season::from_month(month)
        .map(|season| season.to_string())
        .ok_or_else(|| format!("Month must be between 1 and 12, got {}", month))
}

/// Meteorological season of a month (1-12)
#[wasm_bindgen]
pub fn season_for_month(month: u32) -> Result<String, JsValue> {
    season_name(month).map_err(to_js_error)
}

/// Season of a `YYYY-MM-DD` sowing date, or an empty string for a bad date
#[wasm_bindgen]
pub fn season_for_date(sow_date: &str) -> String {
    validate_date(sow_date)
        .map(|d| Season::from_date(d).to_string())
        .unwrap_or_default()
}

/// Display form of an irrigation rate, e.g. `"12.34 lphw"`
#[wasm_bindgen]
pub fn format_irrigation_rate(rate: f64) -> String {
    format_lphw(rate)
}

/// Check a date typed into a form before it is submitted
#[wasm_bindgen]
pub fn is_valid_date(value: &str) -> bool {
    validate_date(value).is_ok()
}
