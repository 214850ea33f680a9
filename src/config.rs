use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::analysis::AnalysisOptions;
use crate::services::report::ReportOptions;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

fn default_max_chart_categories() -> usize {
    50
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_file_size: usize,
    pub log_level: String,
    /// Categorical summaries with more distinct values than this are not charted.
    pub max_chart_categories: usize,
    pub analysis: AnalysisOptions,
    pub report: ReportOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            log_level: "info".to_string(),
            max_chart_categories: default_max_chart_categories(),
            analysis: AnalysisOptions::default(),
            report: ReportOptions::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let mut config = Config::default();

        if let Some(addr) = env_parse::<SocketAddr>("STATSCOPE_ADDR")? {
            config.addr = addr;
        }
        if let Some(size) = env_parse("STATSCOPE_MAX_FILE_SIZE")? {
            config.max_file_size = size;
        }
        if let Ok(level) = std::env::var("STATSCOPE_LOG") {
            config.log_level = level;
        }
        if let Some(limit) = env_parse("STATSCOPE_MAX_CHART_CATEGORIES")? {
            config.max_chart_categories = limit;
        }
        if let Some(cap) = env_parse("STATSCOPE_MAX_NUMERIC_COLUMNS")? {
            config.analysis.max_numeric_columns = cap;
        }
        if let Some(cap) = env_parse("STATSCOPE_MAX_CATEGORICAL_COLUMNS")? {
            config.analysis.max_categorical_columns = cap;
        }
        if let Some(threshold) = env_parse("STATSCOPE_CORRELATION_THRESHOLD")? {
            config.analysis.correlation_threshold = threshold;
        }
        if let Some(top) = env_parse("STATSCOPE_TOP_VALUES")? {
            config.analysis.top_values = top;
        }
        if let Some(include) = env_parse("STATSCOPE_REPORT_CATEGORIES")? {
            config.report.include_categories = include;
        }

        Ok(config)
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(None),
    }
}
