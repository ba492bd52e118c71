//! Crop Cycle Prediction - Backend Server
//!
//! Predicts growth-stage timelines and weekly irrigation for a crop from its
//! sowing date, and tracks fields, crop lifecycles and yield estimates for
//! anonymous IP-keyed sessions.

use axum::{
    routing::{get, post},
    Router,
};
use shared::prediction::CropCyclePredictor;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

use services::{CropLifecycleService, PredictionService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    /// `None` when the trained models failed to load
    pub predictor: Option<Arc<CropCyclePredictor>>,
}

impl AppState {
    pub fn prediction_service(&self) -> PredictionService {
        PredictionService::new(self.predictor.clone(), self.config.prediction.synthetic_seed)
    }

    pub fn lifecycle_service(&self) -> CropLifecycleService {
        CropLifecycleService::new(self.db.clone(), self.prediction_service())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Crop Cycle Prediction Server");
    tracing::info!("Environment: {}", config.environment);

    // Load trained models; serve without predictions if they are unusable
    let models_dir = Path::new(&config.models.directory);
    let predictor = match external::trained_models::load(models_dir) {
        Ok(predictor) => {
            tracing::info!(
                "Loaded crop cycle models from {}: stages {:?}, crops {:?}",
                models_dir.display(),
                predictor.stages(),
                predictor.recognized_crops()
            );
            Some(Arc::new(predictor))
        }
        Err(e) => {
            tracing::error!(
                "Failed to load crop cycle models from {}: {}. Prediction endpoints will return 503",
                models_dir.display(),
                e
            );
            None
        }
    };

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
        predictor,
    };

    let app = create_app(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/predict-crop-cycle", post(handlers::predict_crop_cycle))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
