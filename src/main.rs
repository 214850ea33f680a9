use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use statscope::{config::Config, logging, routes, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_logging(&config.log_level)?;

    let addr = config.addr;
    let state = Arc::new(AppState::new(config).context("Failed to build HTTP client")?);

    let app = Router::new()
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
