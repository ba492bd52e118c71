//! HTTP handlers

pub mod field;
pub mod health;
pub mod lifecycle;
pub mod prediction;
pub mod session;
pub mod yield_prediction;

pub use field::*;
pub use health::*;
pub use lifecycle::*;
pub use prediction::*;
pub use session::get_session;
pub use yield_prediction::*;
