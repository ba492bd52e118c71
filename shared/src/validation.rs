//! Validation utilities for field, crop and yield records
//!
//! Range checks on plain numeric fields live on the models as `validator`
//! derives; the rules here need more than a range.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::YieldInputs;
use crate::types::{parse_iso_date, GeoPoint};

pub const MAX_NAME_LENGTH: usize = 100;

/// Largest field in hectares
pub const MAX_AREA: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest single water (mm) or fertilizer (kg/ha) application
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Largest harvest in tonnes per hectare
pub const MAX_YIELD: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

// ============================================================================
// Field Validations
// ============================================================================

/// Validate a field or crop name: non-blank and reasonably short
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// Validate a field outline
pub fn validate_coordinates(points: &[GeoPoint]) -> Result<(), &'static str> {
    if points.is_empty() {
        return Err("Coordinates cannot be empty");
    }
    let in_range = points
        .iter()
        .all(|p| (-90.0..=90.0).contains(&p.lat) && (-180.0..=180.0).contains(&p.lng));
    if !in_range {
        return Err("Coordinates must be valid latitude/longitude pairs");
    }
    Ok(())
}

/// Validate a field area in hectares
pub fn validate_area(area: Decimal) -> Result<(), &'static str> {
    if area <= Decimal::ZERO {
        return Err("Area must be greater than 0");
    }
    if area > MAX_AREA {
        return Err("Area must be at most 1000000 hectares");
    }
    Ok(())
}

// ============================================================================
// Crop Lifecycle Validations
// ============================================================================

/// Validate a strict `YYYY-MM-DD` date
pub fn validate_date(value: &str) -> Result<NaiveDate, &'static str> {
    parse_iso_date(value)
}

/// Validate an applied amount (water in mm, fertilizer in kg/ha)
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount > MAX_AMOUNT {
        return Err("Amount must be at most 100000");
    }
    Ok(())
}

/// Validate that a harvest does not precede sowing
pub fn validate_harvest_after_sowing(
    sowing_date: NaiveDate,
    harvest_date: NaiveDate,
) -> Result<(), &'static str> {
    if harvest_date < sowing_date {
        return Err("Harvest date cannot be before sowing date");
    }
    Ok(())
}

// ============================================================================
// Yield Validations
// ============================================================================

/// Validate a harvested yield in tonnes per hectare
pub fn validate_yield(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Yield cannot be negative");
    }
    if value > MAX_YIELD {
        return Err("Yield must be at most 1000 tonnes per hectare");
    }
    Ok(())
}

/// Validate soil pH
pub fn validate_ph(ph: Decimal) -> Result<(), &'static str> {
    if ph < Decimal::ZERO || ph > Decimal::from(14) {
        return Err("pH must be between 0 and 14");
    }
    Ok(())
}

/// Validate the inputs of a yield estimate, naming the first bad field
pub fn validate_yield_inputs(inputs: &YieldInputs) -> Result<(), (&'static str, &'static str)> {
    validate_name(&inputs.crop_name).map_err(|msg| ("crop_name", msg))?;
    if let Some(area) = inputs.field_area {
        validate_area(area).map_err(|msg| ("field_area", msg))?;
    }
    for (field, value) in [
        ("nitrogen", inputs.nitrogen),
        ("phosphorus", inputs.phosphorus),
        ("potassium", inputs.potassium),
        ("irrigation_total", inputs.irrigation_total),
    ] {
        if let Some(value) = value {
            validate_amount(value).map_err(|msg| (field, msg))?;
        }
    }
    if let Some(ph) = inputs.ph {
        validate_ph(ph).map_err(|msg| ("ph", msg))?;
    }
    Ok(())
}
