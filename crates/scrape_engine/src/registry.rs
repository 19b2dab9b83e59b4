use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use scrape_core::{PostRecord, ScrapeError, Stage};
use scrape_logging::scrape_debug;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::{CsvExport, JobId, ProgressSink, ScrapeEvent};

/// Export of one finished scrape, written at most once.
pub type ExportSlot = Arc<OnceCell<CsvExport>>;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// How long a finished entry stays readable.
    pub ttl: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Point-in-time copy of one background scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub target: String,
    pub keyword: Option<String>,
    pub stage: Stage,
    pub outcome: Option<Result<Vec<PostRecord>, ScrapeError>>,
}

struct Entry {
    snapshot: JobSnapshot,
    cancel: CancellationToken,
    finished_at: Option<Instant>,
    export: ExportSlot,
}

/// In-memory status table for background scrapes.
///
/// Ids come from a counter, so concurrent registrations never collide. Each
/// writer only touches its own entry. Finished entries expire `ttl` after
/// completion; expired entries are swept on every registration and lookup.
pub struct JobRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<JobId, Entry>>,
    settings: RegistrySettings,
}

impl JobRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
            settings,
        }
    }

    /// Creates an `Idle` entry and returns its id with a fresh cancellation token.
    pub fn register(
        &self,
        target: impl Into<String>,
        keyword: Option<String>,
    ) -> (JobId, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let mut entries = self.lock();
        sweep(&mut entries, Instant::now(), self.settings.ttl);
        entries.insert(
            id,
            Entry {
                snapshot: JobSnapshot {
                    id,
                    target: target.into(),
                    keyword,
                    stage: Stage::Idle,
                    outcome: None,
                },
                cancel: cancel.clone(),
                finished_at: None,
                export: ExportSlot::default(),
            },
        );
        (id, cancel)
    }

    pub fn set_stage(&self, id: JobId, stage: Stage) {
        if let Some(entry) = self.lock().get_mut(&id) {
            if !entry.snapshot.stage.is_finished() {
                entry.snapshot.stage = stage;
            }
        }
    }

    /// Stores the final outcome; the entry starts aging from now.
    pub fn finish(&self, id: JobId, outcome: Result<Vec<PostRecord>, ScrapeError>) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.snapshot.stage = if outcome.is_ok() {
                Stage::Done
            } else {
                Stage::Reported
            };
            entry.snapshot.outcome = Some(outcome);
            entry.finished_at = Some(Instant::now());
        }
    }

    pub fn get(&self, id: JobId) -> Option<JobSnapshot> {
        let mut entries = self.lock();
        sweep(&mut entries, Instant::now(), self.settings.ttl);
        entries.get(&id).map(|entry| entry.snapshot.clone())
    }

    /// Export slot of a successfully finished entry.
    pub fn export_slot(&self, id: JobId) -> Option<ExportSlot> {
        let mut entries = self.lock();
        sweep(&mut entries, Instant::now(), self.settings.ttl);
        entries
            .get(&id)
            .filter(|entry| matches!(entry.snapshot.outcome, Some(Ok(_))))
            .map(|entry| entry.export.clone())
    }

    /// Stops local waiting for an unfinished entry. The remote job is untouched.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.lock().get(&id) {
            Some(entry) if !entry.snapshot.stage.is_finished() => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops finished entries older than the ttl as of `now`. Returns the count.
    pub fn evict_expired_at(&self, now: Instant) -> usize {
        sweep(&mut self.lock(), now, self.settings.ttl)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl ProgressSink for JobRegistry {
    fn emit(&self, event: ScrapeEvent) {
        if let ScrapeEvent::StageChanged { job_id, stage } = event {
            self.set_stage(job_id, stage);
        }
    }
}

fn sweep(entries: &mut HashMap<JobId, Entry>, now: Instant, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| match entry.finished_at {
        Some(finished) => now.saturating_duration_since(finished) < ttl,
        None => true,
    });
    let evicted = before - entries.len();
    if evicted > 0 {
        scrape_debug!("Evicted {} expired scrape entries", evicted);
    }
    evicted
}
