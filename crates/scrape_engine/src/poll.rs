use std::sync::Arc;
use std::time::Duration;

use scrape_core::{InvalidTransition, JobState, ScrapeError};
use scrape_logging::{scrape_debug, scrape_info, scrape_warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    JobHandle, JobId, JobProvider, ProgressSink, ProviderError, ProviderFailureKind, ScrapeEvent,
};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Total time budget, measured from the first status query.
    pub deadline: Duration,
    pub pending_interval: Duration,
    pub running_interval: Duration,
    /// Wait after a transient status-query failure.
    pub retry_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(300),
            pending_interval: Duration::from_secs(5),
            running_interval: Duration::from_secs(3),
            retry_interval: Duration::from_secs(10),
        }
    }
}

impl PollSettings {
    fn interval_for(&self, state: &JobState) -> Duration {
        match state {
            JobState::Pending => self.pending_interval,
            _ => self.running_interval,
        }
    }
}

/// Queries job status until a terminal state or the deadline.
///
/// Timing out only stops the local wait; the remote job is not cancelled and
/// may keep running on the provider.
#[derive(Clone)]
pub struct Poller {
    provider: Arc<dyn JobProvider>,
    settings: PollSettings,
}

impl Poller {
    pub fn new(provider: Arc<dyn JobProvider>, settings: PollSettings) -> Self {
        Self { provider, settings }
    }

    /// Returns `Succeeded`, `Failed(reason)` or `TimedOut`.
    ///
    /// Transient query failures are retried until the deadline. If the last
    /// query before the deadline failed that way, the failure surfaces as
    /// [`ScrapeError::ProviderUnreachable`]. A query still in flight at the
    /// deadline is abandoned, and cancellation interrupts it too.
    pub async fn wait(
        &self,
        job_id: JobId,
        handle: &JobHandle,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<JobState, ScrapeError> {
        let deadline = Instant::now() + self.settings.deadline;
        let mut state = JobState::Pending;
        let mut last_error: Option<ProviderError> = None;
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                scrape_info!("Job {} polling cancelled after {} queries", job_id, attempt);
                return Err(ScrapeError::Cancelled);
            }
            if Instant::now() >= deadline {
                return expire(job_id, state, last_error, attempt);
            }

            attempt += 1;
            let answer = tokio::select! {
                _ = cancel.cancelled() => {
                    scrape_info!("Job {} cancelled during query #{}", job_id, attempt);
                    return Err(ScrapeError::Cancelled);
                }
                answer = tokio::time::timeout_at(deadline, self.provider.status(handle)) => answer,
            };
            let Ok(answer) = answer else {
                scrape_warn!("Job {} query #{} outlived the deadline", job_id, attempt);
                return expire(job_id, state, last_error, attempt);
            };

            let interval = match answer {
                Ok(status) => {
                    last_error = None;
                    if !JobState::is_recognized(&status.state) {
                        scrape_warn!(
                            "Job {} reported unrecognized state {:?}; treating as running",
                            job_id,
                            status.state
                        );
                    }
                    let observed = JobState::from_provider(&status.state, status.message.as_deref());
                    state = match state.advance(observed) {
                        Ok(next) => next,
                        Err(InvalidTransition { from, .. }) => from,
                    };
                    scrape_debug!("Job {} poll #{} state={}", job_id, attempt, state);
                    sink.emit(ScrapeEvent::Polled {
                        job_id,
                        attempt,
                        state: state.clone(),
                    });
                    if state.is_terminal() {
                        scrape_info!(
                            "Job {} reached {} after {} queries",
                            job_id,
                            state,
                            attempt
                        );
                        return Ok(state);
                    }
                    self.settings.interval_for(&state)
                }
                Err(err) if err.is_transient() => {
                    scrape_warn!("Job {} poll #{} failed, will retry: {}", job_id, attempt, err);
                    last_error = Some(err);
                    self.settings.retry_interval
                }
                Err(err) if err.kind == ProviderFailureKind::Decode => {
                    scrape_warn!("Job {} status answer undecodable: {}", job_id, err);
                    return Err(ScrapeError::MalformedResponse(err.message));
                }
                Err(err) => {
                    scrape_warn!("Job {} status query rejected: {}", job_id, err);
                    return Err(ScrapeError::Failed(format!(
                        "status query rejected: {err}"
                    )));
                }
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(interval.min(remaining)) => {}
            }
        }
    }
}

fn expire(
    job_id: JobId,
    state: JobState,
    last_error: Option<ProviderError>,
    attempt: u32,
) -> Result<JobState, ScrapeError> {
    if let Some(err) = last_error {
        scrape_warn!(
            "Job {} deadline elapsed after {} queries; provider unreachable",
            job_id,
            attempt
        );
        return Err(ScrapeError::ProviderUnreachable(err.to_string()));
    }
    scrape_warn!(
        "Job {} deadline elapsed after {} queries in state {}",
        job_id,
        attempt,
        state
    );
    Ok(state.advance(JobState::TimedOut).unwrap_or(JobState::TimedOut))
}
