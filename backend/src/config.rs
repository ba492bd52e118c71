//! Configuration management for the crop cycle server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CROP_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Trained model artifacts
    pub models: ModelsConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding feature_columns.json, stages.json and the stage models
    pub directory: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PredictionConfig {
    /// Fixed seed for synthetic weather and soil; random per request when unset
    pub synthetic_seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Key sessions on the first X-Forwarded-For address instead of the peer
    pub trust_forwarded_for: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CROP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5002)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("models.directory", "trained_models")?
            .set_default("session.trust_forwarded_for", false)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // CROP__DATABASE__URL and friends
            .add_source(
                Environment::with_prefix("CROP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
