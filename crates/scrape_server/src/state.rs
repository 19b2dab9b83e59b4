use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use scrape_core::{JobRequest, Normalizer, ResultLimit};
use scrape_engine::{
    EngineHandle, HttpJobProvider, JobRegistry, PollSettings, ProviderSettings, RegistrySettings,
    Scraper,
};

use crate::Config;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub results_dir: PathBuf,
    pub default_limit: ResultLimit,
}

impl AppState {
    pub fn new(engine: EngineHandle, results_dir: PathBuf, default_limit: ResultLimit) -> Self {
        Self {
            engine,
            results_dir,
            default_limit,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = HttpJobProvider::new(
            config.provider_base_url.clone(),
            config.provider_token.clone(),
            ProviderSettings::default(),
        )
        .context("Failed to build provider client")?;

        let poll_settings = PollSettings {
            deadline: config.poll_deadline,
            ..PollSettings::default()
        };
        let scraper = Scraper::new(
            Arc::new(provider),
            poll_settings,
            Normalizer::new(config.title_fallback),
        );
        let registry = JobRegistry::new(RegistrySettings {
            ttl: config.job_ttl,
        });

        Ok(Self::new(
            EngineHandle::new(Arc::new(scraper), Arc::new(registry)),
            config.results_dir.clone(),
            config.default_limit,
        ))
    }

    /// Builds a request; an explicit `limit` of 0 means unbounded.
    pub fn job_request(&self, username: &str, limit: Option<u32>) -> JobRequest {
        let limit = limit
            .map(ResultLimit::from_count)
            .unwrap_or(self.default_limit);
        JobRequest::new(username).with_limit(limit)
    }
}
