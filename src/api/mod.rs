//! HTTP API for the chat backend.

mod routes;
mod types;

pub use routes::{router, AppState};
pub use types::{HealthResponse, MessageRequest, MessageResponse};

use std::sync::Arc;

use crate::config::Config;

/// Wire up application state and serve until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
