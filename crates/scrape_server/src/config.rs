use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use log::LevelFilter;
use scrape_core::{ResultLimit, TitleFallback};
use scrape_logging::LogDestination;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub provider_base_url: String,
    pub provider_token: Option<String>,
    pub poll_deadline: Duration,
    pub default_limit: ResultLimit,
    pub title_fallback: TitleFallback,
    pub job_ttl: Duration,
    pub results_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            provider_base_url: var("PROVIDER_BASE_URL")
                .context("PROVIDER_BASE_URL must be set")?,
            provider_token: var("PROVIDER_TOKEN"),
            poll_deadline: Duration::from_secs(
                var("POLL_DEADLINE_SECS")
                    .unwrap_or_else(|| "300".to_string())
                    .parse()
                    .context("POLL_DEADLINE_SECS must be a number of seconds")?,
            ),
            default_limit: ResultLimit::from_count(
                var("DEFAULT_RESULT_LIMIT")
                    .unwrap_or_else(|| "50".to_string())
                    .parse()
                    .context("DEFAULT_RESULT_LIMIT must be a non-negative number")?,
            ),
            title_fallback: var("TITLE_FALLBACK")
                .unwrap_or_else(|| "placeholder".to_string())
                .parse()
                .map_err(|err: String| anyhow!(err))
                .context("TITLE_FALLBACK must be 'empty' or 'placeholder'")?,
            job_ttl: Duration::from_secs(
                var("JOB_TTL_SECS")
                    .unwrap_or_else(|| "3600".to_string())
                    .parse()
                    .context("JOB_TTL_SECS must be a number of seconds")?,
            ),
            results_dir: PathBuf::from(
                var("RESULTS_DIR").unwrap_or_else(|| "scraped_results".to_string()),
            ),
            log_destination: var("LOG_DESTINATION")
                .unwrap_or_else(|| "terminal".to_string())
                .parse()
                .map_err(|err: String| anyhow!(err))
                .context("LOG_DESTINATION must be 'terminal', 'file' or 'both'")?,
            log_level: var("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .parse()
                .context("LOG_LEVEL must be a log level")?,
        })
    }
}
