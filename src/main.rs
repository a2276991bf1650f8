use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};
use askara_core::DocumentService;

/// Main entry point for the Askara application
///
/// Loads `.env`, resolves the core configuration once and serves the REST API
/// (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `ASKARA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `ASKARA_DATA_DIR`: Directory for documents and preferences (default: "askara_data")
/// - `ASKARA_TEMPLATE_DIR`: Directory of YAML templates (default: built-in catalog)
/// - `ASKARA_PLACEHOLDER_SYNTAX`: `curly` or `square`, for templates that do not set their own
/// - `ASKARA_EMPTY_FIELDS`: `bracketed`, `blank` or `keep`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("askara_run=info".parse()?)
                .add_directive("askara_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ASKARA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = core_config_from_env()?;
    tracing::info!("++ Askara data directory: {}", cfg.data_dir().display());
    match cfg.template_dir() {
        Some(dir) => tracing::info!("++ Templates from {}", dir.display()),
        None => tracing::info!("++ Using the built-in template catalog"),
    }

    let service = DocumentService::from_config(&cfg)?;
    let app = router(AppState::new(Arc::new(service)));

    tracing::info!("++ Starting Askara REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
