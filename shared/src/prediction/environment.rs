//! Weather and soil inputs for predictions without sensor data
//!
//! [`SyntheticEnvironment`] draws plausible seasonal values. It is a stand-in
//! for a real data source: anything implementing [`EnvironmentSource`] can
//! replace it.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{SoilSample, WeatherSample};

/// Meteorological season of the sowing month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// December to February
    Winter,
    /// March to May
    Spring,
    /// June to August
    Summer,
    /// September to November
    Autumn,
}

/// Season of each month, January first
const SEASON_BY_MONTH: [Season; 12] = [
    Season::Winter,
    Season::Winter,
    Season::Spring,
    Season::Spring,
    Season::Spring,
    Season::Summer,
    Season::Summer,
    Season::Summer,
    Season::Autumn,
    Season::Autumn,
    Season::Autumn,
    Season::Winter,
];

impl Season {
    /// Season of a month numbered 1-12; `None` for anything else
    pub fn from_month(month: u32) -> Option<Self> {
        let index = usize::try_from(month.checked_sub(1)?).ok()?;
        SEASON_BY_MONTH.get(index).copied()
    }

    pub fn from_date(date: NaiveDate) -> Self {
        SEASON_BY_MONTH[date.month0() as usize]
    }

    /// Baseline weather before jitter
    pub fn baseline(&self) -> WeatherSample {
        let (temperature_c, rainfall_mm, humidity_pct) = match self {
            Season::Winter => (20.0, 50.0, 60.0),
            Season::Spring => (25.0, 80.0, 65.0),
            Season::Summer => (32.0, 120.0, 75.0),
            Season::Autumn => (28.0, 70.0, 70.0),
        };
        WeatherSample {
            temperature_c,
            rainfall_mm,
            humidity_pct,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Winter => write!(f, "Winter"),
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Autumn => write!(f, "Autumn"),
        }
    }
}

/// Source of weather and soil conditions for a prediction
pub trait EnvironmentSource {
    fn weather(&mut self, sow_date: NaiveDate) -> WeatherSample;
    fn soil(&mut self) -> SoilSample;
}

pub const MIN_RAINFALL_MM: f64 = 10.0;
pub const MIN_HUMIDITY_PCT: f64 = 40.0;
pub const MAX_HUMIDITY_PCT: f64 = 90.0;

/// Seasonal baseline plus bounded uniform jitter, from an explicit random source
#[derive(Debug, Clone)]
pub struct SyntheticEnvironment<R> {
    rng: R,
}

impl SyntheticEnvironment<StdRng> {
    /// Reproducible generator: the same seed yields the same draws
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SyntheticEnvironment<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate_weather(&mut self, sow_date: NaiveDate) -> WeatherSample {
        let base = Season::from_date(sow_date).baseline();
        let temperature_c = base.temperature_c + self.rng.gen_range(-3.0..3.0);
        let rainfall_mm = (base.rainfall_mm + self.rng.gen_range(-30.0..50.0)).max(MIN_RAINFALL_MM);
        let humidity_pct = (base.humidity_pct + self.rng.gen_range(-10.0..15.0))
            .clamp(MIN_HUMIDITY_PCT, MAX_HUMIDITY_PCT);

        WeatherSample {
            temperature_c,
            rainfall_mm,
            humidity_pct,
        }
    }

    pub fn generate_soil(&mut self) -> SoilSample {
        SoilSample {
            moisture_pct: self.rng.gen_range(20.0..35.0),
            nitrogen: Some(self.rng.gen_range(0.8..1.5)),
            phosphorus: Some(self.rng.gen_range(15.0..35.0)),
            potassium: Some(self.rng.gen_range(150.0..300.0)),
            ph: Some(self.rng.gen_range(6.0..7.5)),
        }
    }
}

impl<R: Rng> EnvironmentSource for SyntheticEnvironment<R> {
    fn weather(&mut self, sow_date: NaiveDate) -> WeatherSample {
        self.generate_weather(sow_date)
    }

    fn soil(&mut self) -> SoilSample {
        self.generate_soil()
    }
}
