use std::sync::Arc;

use scrape_core::{
    update, JobRequest, JobState, Normalizer, PostRecord, RawResult, ScrapeError, Stage, StageMsg,
};
use scrape_logging::{scrape_error, scrape_info};
use tokio_util::sync::CancellationToken;

use crate::{
    JobHandle, JobId, JobProvider, PollSettings, Poller, ProviderError, ProviderFailureKind,
    ScrapeEvent, Submitter,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScrapeEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ScrapeEvent) {}
}

/// Submit → poll → fetch → normalize, for one provider.
#[derive(Clone)]
pub struct Scraper {
    provider: Arc<dyn JobProvider>,
    submitter: Submitter,
    poller: Poller,
    normalizer: Normalizer,
}

impl Scraper {
    pub fn new(
        provider: Arc<dyn JobProvider>,
        poll_settings: PollSettings,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            submitter: Submitter::new(provider.clone()),
            poller: Poller::new(provider.clone(), poll_settings),
            provider,
            normalizer,
        }
    }

    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, ScrapeError> {
        self.submitter.submit(request).await
    }

    /// Waits for the job and fetches its decoded result payload.
    pub async fn await_job(
        &self,
        handle: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<RawResult, ScrapeError> {
        self.await_job_with(0, handle, &NullSink, cancel).await
    }

    pub fn normalize(&self, raw: RawResult) -> Result<Vec<PostRecord>, ScrapeError> {
        self.normalizer.normalize(raw)
    }

    /// Runs the whole pipeline with no progress reporting.
    pub async fn scrape(&self, request: JobRequest) -> Result<Vec<PostRecord>, ScrapeError> {
        self.run(0, request, &NullSink, &CancellationToken::new())
            .await
    }

    /// Runs the whole pipeline, reporting each stage change to `sink`.
    pub async fn run(
        &self,
        job_id: JobId,
        request: JobRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<PostRecord>, ScrapeError> {
        let mut tracker = StageTracker {
            job_id,
            stage: Stage::Idle,
            sink,
        };
        let target = request.target().to_string();

        let result = async {
            let handle = self.submit(request).await?;
            tracker.apply(StageMsg::Accepted);
            tracker.apply(StageMsg::PollStarted);
            let raw = self.await_job_with(job_id, &handle, sink, cancel).await?;
            tracker.apply(StageMsg::JobSucceeded);
            let records = self.normalize(raw)?;
            tracker.apply(StageMsg::Normalized);
            Ok::<_, ScrapeError>(records)
        }
        .await;

        match &result {
            Ok(records) => {
                scrape_info!(
                    "Job {} target={} done with {} records",
                    job_id,
                    target,
                    records.len()
                );
            }
            Err(err) => {
                tracker.apply(StageMsg::Failed);
                scrape_error!("Job {} target={} reported: {}", job_id, target, err);
            }
        }
        result
    }

    async fn await_job_with(
        &self,
        job_id: JobId,
        handle: &JobHandle,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RawResult, ScrapeError> {
        match self.poller.wait(job_id, handle, sink, cancel).await? {
            JobState::Succeeded => {}
            JobState::Failed(reason) => return Err(ScrapeError::Failed(reason)),
            JobState::TimedOut => return Err(ScrapeError::TimedOut),
            other => {
                return Err(ScrapeError::Failed(format!(
                    "polling stopped in non-terminal state {other}"
                )))
            }
        }

        let payload = self
            .provider
            .results(handle)
            .await
            .map_err(results_error)?;
        RawResult::decode(payload)
    }
}

struct StageTracker<'a> {
    job_id: JobId,
    stage: Stage,
    sink: &'a dyn ProgressSink,
}

impl StageTracker<'_> {
    fn apply(&mut self, msg: StageMsg) {
        let next = update(self.stage, msg);
        if next != self.stage {
            scrape_info!("Job {} stage {:?} -> {:?}", self.job_id, self.stage, next);
            self.stage = next;
            self.sink.emit(ScrapeEvent::StageChanged {
                job_id: self.job_id,
                stage: next,
            });
        }
    }
}

fn results_error(err: ProviderError) -> ScrapeError {
    match err.kind {
        ProviderFailureKind::Network | ProviderFailureKind::Timeout => {
            ScrapeError::ProviderUnreachable(err.message)
        }
        ProviderFailureKind::HttpStatus(status) => ScrapeError::Failed(format!(
            "results query rejected with status {status}: {}",
            err.message
        )),
        ProviderFailureKind::Decode => ScrapeError::MalformedResponse(err.message),
    }
}
