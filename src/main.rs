//! Canvas Chat - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the chat endpoint.

use canvas_chat::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvas_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.gemini_model);
    if config.canvas.is_some() {
        info!("Canvas course tools enabled");
    }
    if let Some(path) = &config.fixture_path {
        info!("Fixture lookup tool enabled: {}", path.display());
    }

    // Start HTTP server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    api::serve(config).await?;

    Ok(())
}
