mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{failed, network_error, status, RecordingSink, ScriptedProvider};
use scrape_core::{JobState, ScrapeError};
use scrape_engine::{
    JobHandle, JobProvider, NullSink, PollSettings, Poller, ProviderError, ProviderFailureKind,
    ProviderStatus, ScrapeEvent, Submission,
};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn settings(deadline_secs: u64) -> PollSettings {
    PollSettings {
        deadline: Duration::from_secs(deadline_secs),
        pending_interval: Duration::from_secs(5),
        running_interval: Duration::from_secs(3),
        retry_interval: Duration::from_secs(4),
    }
}

async fn wait(provider: &Arc<ScriptedProvider>, settings: PollSettings) -> Result<JobState, ScrapeError> {
    scrape_logging::initialize_for_tests();
    let poller = Poller::new(provider.clone(), settings);
    poller
        .wait(1, &JobHandle::new("job-1"), &NullSink, &CancellationToken::new())
        .await
}

/// Provider whose status queries hang for `stall` before answering `succeeded`.
struct StallingProvider {
    stall: Duration,
    status_calls: AtomicUsize,
}

impl StallingProvider {
    fn new(stall: Duration) -> Self {
        Self {
            stall,
            status_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl JobProvider for StallingProvider {
    async fn submit(&self, _submission: &Submission) -> Result<JobHandle, ProviderError> {
        Ok(JobHandle::new("job-1"))
    }

    async fn status(&self, _handle: &JobHandle) -> Result<ProviderStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.stall).await;
        status("succeeded")
    }

    async fn results(&self, _handle: &JobHandle) -> Result<Value, ProviderError> {
        Ok(Value::Null)
    }
}

/// Paused clock: elapsed time is exact up to timer-wheel rounding.
fn assert_elapsed(started: Instant, secs: u64) {
    let elapsed = started.elapsed();
    let expected = Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn issues_one_query_per_running_report_plus_the_terminal_one() {
    for n in [0, 5] {
        let provider = Arc::new(ScriptedProvider::running_then(n, "succeeded", Value::Null));
        let state = wait(&provider, settings(300)).await.unwrap();
        assert_eq!(state, JobState::Succeeded);
        assert_eq!(provider.status_calls(), n + 1, "n = {n}");
        assert_eq!(provider.submit_calls(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn times_out_at_the_deadline() {
    let provider = Arc::new(ScriptedProvider::never_finishing());
    let started = Instant::now();
    let state = wait(&provider, settings(10)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(state, JobState::TimedOut);
    assert!(elapsed >= Duration::from_secs(10), "returned early: {elapsed:?}");
    assert!(
        elapsed <= Duration::from_secs(10) + Duration::from_secs(3),
        "returned late: {elapsed:?}"
    );
    // Queries at t = 0, 3, 6 and 9.
    assert_eq!(provider.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn pending_jobs_use_the_pending_interval() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![status("pending"), status("pending")],
        status("succeeded"),
        Value::Null,
    ));
    let started = Instant::now();
    let state = wait(&provider, settings(300)).await.unwrap();
    assert_eq!(state, JobState::Succeeded);
    assert_elapsed(started, 10);
}

#[tokio::test(start_paused = true)]
async fn failure_carries_provider_message() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![status("running")],
        failed("actor crashed"),
        Value::Null,
    ));
    let state = wait(&provider, settings(300)).await.unwrap();
    assert_eq!(state, JobState::Failed("actor crashed".to_string()));
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_states_keep_polling() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![status("WARMING_UP"), status("")],
        status("SUCCEEDED"),
        Value::Null,
    ));
    let state = wait(&provider, settings(300)).await.unwrap();
    assert_eq!(state, JobState::Succeeded);
    assert_eq!(provider.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn network_errors_are_retried_including_the_first_query() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![network_error(), status("running"), network_error()],
        status("succeeded"),
        Value::Null,
    ));
    let state = wait(&provider, settings(300)).await.unwrap();
    assert_eq!(state, JobState::Succeeded);
    assert_eq!(provider.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_retried() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Err(ProviderError::new(
            ProviderFailureKind::HttpStatus(503),
            "busy",
        ))],
        status("succeeded"),
        Value::Null,
    ));
    assert_eq!(wait(&provider, settings(300)).await.unwrap(), JobState::Succeeded);
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unreachable_provider_surfaces_after_deadline() {
    let provider = Arc::new(ScriptedProvider::new(Vec::new(), network_error(), Value::Null));
    let started = Instant::now();
    let err = wait(&provider, settings(10)).await.unwrap_err();
    assert!(matches!(err, ScrapeError::ProviderUnreachable(_)), "{err:?}");
    assert_elapsed(started, 10);
    // Queries at t = 0, 4 and 8.
    assert_eq!(provider.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn rejected_status_query_stops_immediately() {
    let provider = Arc::new(ScriptedProvider::new(
        Vec::new(),
        Err(ProviderError::new(
            ProviderFailureKind::HttpStatus(404),
            "no such job",
        )),
        Value::Null,
    ));
    let err = wait(&provider, settings(300)).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Failed(ref msg) if msg.contains("404")), "{err:?}");
    assert_eq!(provider.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn undecodable_status_answer_is_malformed() {
    let provider = Arc::new(ScriptedProvider::new(
        Vec::new(),
        Err(ProviderError::new(
            ProviderFailureKind::Decode,
            "missing field `state`",
        )),
        Value::Null,
    ));
    let err = wait(&provider, settings(300)).await.unwrap_err();
    assert_eq!(
        err,
        ScrapeError::MalformedResponse("missing field `state`".to_string())
    );
    assert_eq!(provider.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_status_query_does_not_outlive_the_deadline() {
    scrape_logging::initialize_for_tests();
    let provider = Arc::new(StallingProvider::new(Duration::from_secs(25)));
    let poller = Poller::new(provider.clone(), settings(10));

    let started = Instant::now();
    let state = poller
        .wait(1, &JobHandle::new("job-1"), &NullSink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(state, JobState::TimedOut);
    assert_elapsed(started, 10);
    assert_eq!(provider.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_status_query_in_flight() {
    let provider = Arc::new(StallingProvider::new(Duration::from_secs(25)));
    let poller = Poller::new(provider.clone(), settings(300));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = poller
        .wait(1, &JobHandle::new("job-1"), &NullSink, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, ScrapeError::Cancelled);
    assert_elapsed(started, 2);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_issues_no_query() {
    let provider = Arc::new(ScriptedProvider::never_finishing());
    let poller = Poller::new(provider.clone(), settings(300));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = poller
        .wait(1, &JobHandle::new("job-1"), &NullSink, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, ScrapeError::Cancelled);
    assert_eq!(provider.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_sleep() {
    let provider = Arc::new(ScriptedProvider::never_finishing());
    let poller = Poller::new(provider.clone(), settings(300));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(4)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = poller
        .wait(1, &JobHandle::new("job-1"), &NullSink, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, ScrapeError::Cancelled);
    assert_elapsed(started, 4);
    assert_eq!(provider.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn every_observation_is_reported() {
    let provider = Arc::new(ScriptedProvider::running_then(2, "succeeded", Value::Null));
    let poller = Poller::new(provider.clone(), settings(300));
    let sink = RecordingSink::default();
    poller
        .wait(9, &JobHandle::new("job-1"), &sink, &CancellationToken::new())
        .await
        .unwrap();

    let observed: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            ScrapeEvent::Polled { job_id: 9, attempt, state } => Some((attempt, state)),
            _ => None,
        })
        .collect();
    assert_eq!(
        observed,
        vec![
            (1, JobState::Running),
            (2, JobState::Running),
            (3, JobState::Succeeded),
        ]
    );
}
