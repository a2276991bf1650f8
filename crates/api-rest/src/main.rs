//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `askara-run`
//! binary also loads `.env` before serving the same router.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};
use askara_core::DocumentService;

/// Main entry point for the Askara REST API server
///
/// # Environment Variables
/// - `ASKARA_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`core_config_from_env`] for the core settings
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or the template catalog is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("ASKARA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Askara REST API on {}", addr);

    let cfg = core_config_from_env()?;
    let service = DocumentService::from_config(&cfg)?;
    let app = router(AppState::new(Arc::new(service)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
