//! Artifacts produced outside the server

pub mod trained_models;
