use std::sync::Arc;

use scrape_core::JobRequest;
use scrape_logging::scrape_info;

use crate::{ExportSlot, JobId, JobRegistry, JobSnapshot, Scraper};

/// Runs scrapes in the background and tracks them in a [`JobRegistry`].
#[derive(Clone)]
pub struct EngineHandle {
    scraper: Arc<Scraper>,
    registry: Arc<JobRegistry>,
}

impl EngineHandle {
    pub fn new(scraper: Arc<Scraper>, registry: Arc<JobRegistry>) -> Self {
        Self { scraper, registry }
    }

    pub fn scraper(&self) -> &Scraper {
        &self.scraper
    }

    /// Registers the request and spawns its pipeline on the current tokio runtime.
    pub fn enqueue(&self, request: JobRequest, keyword: Option<String>) -> JobId {
        let (job_id, cancel) = self.registry.register(request.target(), keyword);
        scrape_info!("Enqueued background scrape job_id={} target={}", job_id, request.target());

        let scraper = self.scraper.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let outcome = scraper
                .run(job_id, request, registry.as_ref(), &cancel)
                .await;
            registry.finish(job_id, outcome);
        });
        job_id
    }

    pub fn status(&self, job_id: JobId) -> Option<JobSnapshot> {
        self.registry.get(job_id)
    }

    pub fn export_slot(&self, job_id: JobId) -> Option<ExportSlot> {
        self.registry.export_slot(job_id)
    }

    pub fn cancel(&self, job_id: JobId) -> bool {
        self.registry.cancel(job_id)
    }
}
