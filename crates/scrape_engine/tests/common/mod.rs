#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scrape_engine::{
    JobHandle, JobProvider, ProgressSink, ProviderError, ProviderFailureKind, ProviderStatus,
    ScrapeEvent, Submission,
};
use serde_json::Value;

pub fn status(state: &str) -> Result<ProviderStatus, ProviderError> {
    Ok(ProviderStatus {
        state: state.to_string(),
        message: None,
    })
}

pub fn failed(message: &str) -> Result<ProviderStatus, ProviderError> {
    Ok(ProviderStatus {
        state: "failed".to_string(),
        message: Some(message.to_string()),
    })
}

pub fn network_error() -> Result<ProviderStatus, ProviderError> {
    Err(ProviderError::new(
        ProviderFailureKind::Network,
        "connection refused",
    ))
}

/// In-memory provider that replays scripted status answers and counts calls.
pub struct ScriptedProvider {
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    results_calls: AtomicUsize,
    statuses: Mutex<VecDeque<Result<ProviderStatus, ProviderError>>>,
    fallback: Result<ProviderStatus, ProviderError>,
    payload: Value,
}

impl ScriptedProvider {
    /// Answers with `statuses` in order, then `fallback` forever.
    pub fn new(
        statuses: Vec<Result<ProviderStatus, ProviderError>>,
        fallback: Result<ProviderStatus, ProviderError>,
        payload: Value,
    ) -> Self {
        Self {
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            results_calls: AtomicUsize::new(0),
            statuses: Mutex::new(statuses.into()),
            fallback,
            payload,
        }
    }

    /// `running` for the first `n` queries, then `final_state`.
    pub fn running_then(n: usize, final_state: &str, payload: Value) -> Self {
        Self::new(
            (0..n).map(|_| status("running")).collect(),
            status(final_state),
            payload,
        )
    }

    pub fn never_finishing() -> Self {
        Self::new(Vec::new(), status("running"), Value::Null)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn results_calls(&self) -> usize {
        self.results_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobProvider for ScriptedProvider {
    async fn submit(&self, _submission: &Submission) -> Result<JobHandle, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(JobHandle::new("job-1"))
    }

    async fn status(&self, _handle: &JobHandle) -> Result<ProviderStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn results(&self, _handle: &JobHandle) -> Result<Value, ProviderError> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ScrapeEvent>>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ScrapeEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ScrapeEvent) {
        self.events.lock().unwrap().push(event);
    }
}
