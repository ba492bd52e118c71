//! Domain models for the crop cycle platform

mod environment;
mod field;
mod lifecycle;
mod session;
mod yield_prediction;

pub use environment::*;
pub use field::*;
pub use lifecycle::*;
pub use session::*;
pub use yield_prediction::*;
