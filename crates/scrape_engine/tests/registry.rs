mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::ScriptedProvider;
use scrape_core::{
    JobRequest, Normalizer, PostRecord, ScrapeError, Stage,
};
use scrape_engine::{
    EngineHandle, JobId, JobRegistry, JobSnapshot, PollSettings, RegistrySettings, Scraper,
};
use serde_json::json;

fn registry(ttl_secs: u64) -> JobRegistry {
    JobRegistry::new(RegistrySettings {
        ttl: Duration::from_secs(ttl_secs),
    })
}

#[test]
fn registered_entries_start_idle() {
    let registry = registry(60);
    let (id, _cancel) = registry.register("natgeo", Some("travel".to_string()));
    let snapshot = registry.get(id).expect("entry");
    assert_eq!(
        snapshot,
        JobSnapshot {
            id,
            target: "natgeo".to_string(),
            keyword: Some("travel".to_string()),
            stage: Stage::Idle,
            outcome: None,
        }
    );
    assert!(registry.get(id + 100).is_none());
}

#[test]
fn ids_are_unique_under_concurrent_registration() {
    let registry = Arc::new(registry(60));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| registry.register("natgeo", None).0)
                    .collect::<Vec<JobId>>()
            })
        })
        .collect();

    let ids: HashSet<JobId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 400);
    assert_eq!(registry.len(), 400);
}

#[test]
fn finished_entries_expire_after_ttl() {
    let registry = registry(60);
    let (done, _) = registry.register("a", None);
    let (running, _) = registry.register("b", None);
    registry.set_stage(running, Stage::Polling);
    registry.finish(done, Ok(vec![PostRecord::default()]));

    let now = Instant::now();
    assert_eq!(registry.evict_expired_at(now + Duration::from_secs(30)), 0);
    assert_eq!(registry.evict_expired_at(now + Duration::from_secs(61)), 1);
    assert!(registry.get(done).is_none());
    assert_eq!(registry.get(running).unwrap().stage, Stage::Polling);
}

#[test]
fn zero_ttl_entries_vanish_on_next_lookup() {
    let registry = registry(0);
    let (id, _) = registry.register("a", None);
    registry.finish(id, Err(ScrapeError::EmptyResult));
    assert!(registry.get(id).is_none());
    assert!(registry.is_empty());
}

#[test]
fn finish_sets_terminal_stage_and_freezes_it() {
    let registry = registry(60);
    let (id, _) = registry.register("a", None);
    registry.finish(id, Err(ScrapeError::TimedOut));
    registry.set_stage(id, Stage::Polling);

    let snapshot = registry.get(id).unwrap();
    assert_eq!(snapshot.stage, Stage::Reported);
    assert_eq!(snapshot.outcome, Some(Err(ScrapeError::TimedOut)));
}

#[test]
fn cancel_only_applies_to_unfinished_entries() {
    let registry = registry(60);
    let (id, token) = registry.register("a", None);
    assert!(registry.cancel(id));
    assert!(token.is_cancelled());

    registry.finish(id, Err(ScrapeError::Cancelled));
    assert!(!registry.cancel(id));
    assert!(!registry.cancel(999));
}

fn engine(provider: Arc<ScriptedProvider>) -> EngineHandle {
    scrape_logging::initialize_for_tests();
    let scraper = Scraper::new(provider, PollSettings::default(), Normalizer::default());
    EngineHandle::new(Arc::new(scraper), Arc::new(JobRegistry::default()))
}

async fn wait_finished(engine: &EngineHandle, id: JobId) -> JobSnapshot {
    for _ in 0..1_000 {
        if let Some(snapshot) = engine.status(id) {
            if snapshot.stage.is_finished() {
                return snapshot;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("job {id} never finished");
}

#[tokio::test(start_paused = true)]
async fn background_scrape_records_outcome() {
    let provider = Arc::new(ScriptedProvider::running_then(
        3,
        "succeeded",
        json!([{"caption": "hello #world"}]),
    ));
    let engine = engine(provider);

    let id = engine.enqueue(JobRequest::new("natgeo"), Some("hello".to_string()));
    let snapshot = wait_finished(&engine, id).await;

    assert_eq!(snapshot.stage, Stage::Done);
    assert_eq!(snapshot.keyword.as_deref(), Some("hello"));
    let records = snapshot.outcome.unwrap().unwrap();
    assert_eq!(records[0].hashtags, vec!["world"]);
}

#[tokio::test(start_paused = true)]
async fn background_scrape_can_be_cancelled() {
    let provider = Arc::new(ScriptedProvider::never_finishing());
    let engine = engine(provider);

    let id = engine.enqueue(JobRequest::new("natgeo"), None);
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(engine.status(id).unwrap().stage, Stage::Polling);
    assert!(engine.cancel(id));

    let snapshot = wait_finished(&engine, id).await;
    assert_eq!(snapshot.stage, Stage::Reported);
    assert_eq!(snapshot.outcome, Some(Err(ScrapeError::Cancelled)));
}

#[test]
fn export_slot_is_shared_once_the_scrape_succeeded() {
    let registry = registry(60);
    let (ok_id, _) = registry.register("natgeo", None);
    let (failed_id, _) = registry.register("ghost", None);
    assert!(registry.export_slot(ok_id).is_none());

    registry.finish(ok_id, Ok(vec![PostRecord::default()]));
    registry.finish(failed_id, Err(ScrapeError::EmptyResult));

    let first = registry.export_slot(ok_id).expect("slot");
    let second = registry.export_slot(ok_id).expect("slot");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry.export_slot(failed_id).is_none());
    assert!(registry.export_slot(ok_id + 100).is_none());
}
