pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use std::time::Duration;

/// Shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { config, http })
    }
}
