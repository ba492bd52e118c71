//! Shared types, models and the crop-cycle prediction core
//!
//! Used by the backend server and, through WASM, by the browser client.

pub mod models;
pub mod prediction;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
