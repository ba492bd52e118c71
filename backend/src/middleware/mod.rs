//! Request extractors shared by the handlers

pub mod json;
pub mod session;

pub use json::AppJson;
pub use session::{resolve_client_ip, ClientSession};
