//! Grade Predictor - third-trimester score prediction service
//!
//! Serves predictions from a random forest trained on student indicators,
//! along with model management, health and metrics endpoints.

use anyhow::{Context, Result};
use grade_predictor::{
    api,
    config::{LogFormat, ServiceConfig},
};
use predictor_lib::StructuredLogger;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_logging(config: &ServiceConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::load().context("Failed to load configuration")?;
    init_logging(&config);

    info!(
        dataset = %config.dataset_path.display(),
        model = %config.model_path.display(),
        "Grade predictor configured"
    );

    let service = Arc::new(config.build_service());

    // A missing or unreadable artifact is not fatal; /modelo/entrenar can produce one
    let model_loaded = match service.load() {
        Ok(true) => true,
        Ok(false) => {
            info!(path = %config.model_path.display(), "No saved model found, training required");
            false
        }
        Err(e) => {
            warn!(error = %e, "Saved model could not be loaded");
            false
        }
    };

    let logger = StructuredLogger::new("grade-predictor");
    let address = config.bind_address();
    logger.log_startup(SERVICE_VERSION, &address, model_loaded);

    let state = Arc::new(api::AppState::new(service, SERVICE_VERSION));
    api::serve(&address, state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
