//! Fraud Analysis Dashboard - Main Entry Point
//!
//! Loads the model artifacts once and serves the single-page dashboard.

use anyhow::{Context, Result};
use fraud_xai_dashboard::{
    config::{AppConfig, LoggingConfig},
    dashboard::{self, AppState},
    models::loader::{ArtifactLoader, ArtifactState},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    info!("Starting Fraud Analysis Dashboard");
    info!(
        model = %config.artifacts.model_path.display(),
        columns = %config.artifacts.columns_path.display(),
        max_display = config.explanation.max_display,
        "Configuration loaded successfully"
    );

    let state = AppState::new(
        ArtifactLoader::from_config(&config.artifacts),
        config.explanation.clone(),
    );

    // Load eagerly so a missing model shows up in the logs at startup
    match state.artifacts() {
        ArtifactState::Ready(artifacts) => info!(
            trees = artifacts.model.trees().len(),
            features = artifacts.schema.len(),
            "Classifier ready"
        ),
        ArtifactState::Unavailable(reason) => warn!(
            reason = %reason,
            "Serving without a model, analysis is disabled"
        ),
    }

    let app = dashboard::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;

    info!("Dashboard shutting down...");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("fraud_xai_dashboard={}", logging.level))
            .context("Invalid log level")?,
    }
    .add_directive("tower_http=info".parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
