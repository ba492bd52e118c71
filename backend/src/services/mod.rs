//! Business logic services for the crop cycle server

pub mod field;
pub mod lifecycle;
pub mod prediction;
pub mod session;
pub mod yield_prediction;

pub use field::FieldService;
pub use lifecycle::CropLifecycleService;
pub use prediction::PredictionService;
pub use session::SessionService;
pub use yield_prediction::YieldPredictionService;
