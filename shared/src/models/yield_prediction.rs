//! Yield prediction models and the agronomic heuristic behind them

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_NITROGEN: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
pub const DEFAULT_PH: Decimal = Decimal::from_parts(65, 0, 0, false, 1);

/// Below this many mm of recorded irrigation the season counts as dry
pub const MIN_IRRIGATION_TOTAL: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Typical yield in tonnes per hectare
pub fn base_yield(crop_name: &str) -> Decimal {
    match crop_name.to_lowercase().as_str() {
        "rice" => Decimal::new(55, 1),
        "wheat" => Decimal::new(48, 1),
        "corn" | "maize" => Decimal::new(92, 1),
        "sugarcane" => Decimal::new(750, 1),
        "cotton" => Decimal::new(28, 1),
        "soybean" => Decimal::new(32, 1),
        _ => Decimal::new(40, 1),
    }
}

/// Inputs of a yield estimate; absent soil values fall back to typical ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldInputs {
    pub crop_name: String,
    pub field_area: Option<Decimal>,
    pub nitrogen: Option<Decimal>,
    pub phosphorus: Option<Decimal>,
    pub potassium: Option<Decimal>,
    pub ph: Option<Decimal>,
    pub irrigation_total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YieldError {
    #[error("{field} is too large to estimate a yield from")]
    Overflow { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    A,
    B,
    C,
}

impl QualityGrade {
    pub fn from_modifier(modifier: Decimal) -> Self {
        if modifier > Decimal::new(105, 2) {
            QualityGrade::A
        } else if modifier > Decimal::new(95, 2) {
            QualityGrade::B
        } else {
            QualityGrade::C
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEstimate {
    pub expected_yield_per_hectare: Decimal,
    pub total_expected_yield: Decimal,
    pub confidence_score: Decimal,
    pub quality_grade: QualityGrade,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldPredictionStatus {
    Pending,
    Confirmed,
    Completed,
}

impl YieldPredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldPredictionStatus::Pending => "pending",
            YieldPredictionStatus::Confirmed => "confirmed",
            YieldPredictionStatus::Completed => "completed",
        }
    }
}

fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiplicative effect of nitrogen and pH on the base yield
pub fn soil_modifier(nitrogen: Decimal, ph: Decimal) -> Decimal {
    let mut modifier = Decimal::ONE;

    if nitrogen >= Decimal::from(25) && nitrogen <= Decimal::from(35) {
        modifier *= Decimal::new(11, 1);
    } else if nitrogen < Decimal::from(15) || nitrogen > Decimal::from(45) {
        modifier *= Decimal::new(9, 1);
    }

    if ph >= Decimal::from(6) && ph <= Decimal::new(75, 1) {
        modifier *= Decimal::new(105, 2);
    } else if ph < Decimal::new(55, 1) || ph > Decimal::from(8) {
        modifier *= Decimal::new(85, 2);
    }

    modifier
}

pub fn estimate_yield(inputs: &YieldInputs) -> Result<YieldEstimate, YieldError> {
    let nitrogen = inputs.nitrogen.unwrap_or(DEFAULT_NITROGEN);
    let ph = inputs.ph.unwrap_or(DEFAULT_PH);
    let area = inputs.field_area.unwrap_or(Decimal::ONE);
    let irrigation_total = inputs.irrigation_total.unwrap_or(Decimal::ZERO);

    let modifier = soil_modifier(nitrogen, ph);
    let per_hectare = base_yield(&inputs.crop_name) * modifier;

    let confidence = (Decimal::from(85) + (modifier - Decimal::ONE) * Decimal::from(100))
        .clamp(Decimal::from(70), Decimal::from(95));

    let mut risk_factors = Vec::new();
    let mut recommendations = Vec::new();

    if nitrogen < Decimal::from(20) {
        risk_factors.push("Low nitrogen levels may reduce yield".to_string());
        recommendations.push("Consider nitrogen fertilizer application".to_string());
    }

    if ph < Decimal::from(6) {
        risk_factors.push("Acidic soil may affect nutrient uptake".to_string());
        recommendations.push("Consider lime application to increase pH".to_string());
    } else if ph > Decimal::from(8) {
        risk_factors.push("Alkaline soil may limit nutrient availability".to_string());
        recommendations.push("Consider sulfur application to decrease pH".to_string());
    }

    if irrigation_total < MIN_IRRIGATION_TOTAL {
        risk_factors.push("Insufficient irrigation may impact yield".to_string());
        recommendations
            .push("Ensure adequate water supply during critical growth stages".to_string());
    }

    let total = per_hectare
        .checked_mul(area)
        .ok_or(YieldError::Overflow { field: "field_area" })?;

    Ok(YieldEstimate {
        expected_yield_per_hectare: round_dp(per_hectare, 2),
        total_expected_yield: round_dp(total, 2),
        confidence_score: round_dp(confidence, 1),
        quality_grade: QualityGrade::from_modifier(modifier),
        risk_factors,
        recommendations,
    })
}

/// Percentage closeness of the harvested yield to the prediction
pub fn accuracy_score(expected: Decimal, actual: Decimal) -> Option<Decimal> {
    if expected <= Decimal::ZERO {
        return None;
    }
    let error_pct = actual
        .checked_sub(expected)
        .and_then(|diff| diff.abs().checked_div(expected))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));

    // An error too large to represent is certainly past 100%
    let score = match error_pct {
        Some(pct) => (Decimal::ONE_HUNDRED - pct).max(Decimal::ZERO),
        None => Decimal::ZERO,
    };
    Some(round_dp(score, 1))
}
