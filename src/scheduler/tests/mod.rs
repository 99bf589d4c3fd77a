use super::*;
use crate::archive_index::ArchiveIndex;
use crate::archiver::test_helpers::{BlockingSource, TestBackends, fast_retry};
use crate::error::{Error, SourceError};
use crate::event_log::EventLog;
use crate::pipeline::Backends;
use crate::source::{ContentCheck, ContentItem, ContentSource};
use crate::types::{LogEntry, SchedulerMode};
use async_trait::async_trait;
use tokio::sync::broadcast;

const INTERVAL: u64 = 1800;

struct Harness {
    scheduler: Scheduler,
    registry: Arc<RwLock<AccountRegistry>>,
    log: LogWriter,
    archive: Arc<RwLock<ArchiveIndex>>,
    cancel: CancellationToken,
}

impl Harness {
    async fn entries(&self) -> Vec<LogEntry> {
        self.log.log().read().await.all()
    }

    async fn account(&self, handle: &str) -> Option<Account> {
        self.registry
            .read()
            .await
            .list()
            .into_iter()
            .find(|a| a.handle == handle)
    }
}

fn harness(backends: Backends, handles: &[&str]) -> Harness {
    let (event_tx, _rx) = broadcast::channel(1000);
    let log = LogWriter::new(Arc::new(RwLock::new(EventLog::new(1000))), event_tx);
    let archive = Arc::new(RwLock::new(ArchiveIndex::new()));
    let mut registry = AccountRegistry::new();
    registry.seed(handles);
    let registry = Arc::new(RwLock::new(registry));
    let cancel = CancellationToken::new();

    let pipeline = Arc::new(FetchPipeline::new(
        backends,
        archive.clone(),
        log.clone(),
        fast_retry(),
    ));
    let scheduler = Scheduler::new(
        INTERVAL,
        registry.clone(),
        pipeline,
        log.clone(),
        cancel.clone(),
    );

    Harness {
        scheduler,
        registry,
        log,
        archive,
        cancel,
    }
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn completed(dispatch: CycleDispatch) -> CycleReport {
    match dispatch {
        CycleDispatch::Completed(report) => report,
        CycleDispatch::Skipped => panic!("expected the cycle to run"),
    }
}

/// Source that panics for one handle and reports nothing for the rest
struct PanickingSource {
    panic_for: &'static str,
}

#[async_trait]
impl ContentSource for PanickingSource {
    async fn check_for_new_content(
        &self,
        handle: &str,
    ) -> std::result::Result<ContentCheck, SourceError> {
        if handle == self.panic_for {
            panic!("scraper crashed");
        }
        Ok(ContentCheck::NoNewContent)
    }
}

// -----------------------------------------------------------------------
// run/pause state machine
// -----------------------------------------------------------------------

#[tokio::test]
async fn starts_paused_with_full_countdown() {
    let h = harness(TestBackends::new().backends(), &[]);
    let status = h.scheduler.status().await;

    assert_eq!(status.mode, SchedulerMode::Paused);
    assert_eq!(status.interval_seconds, INTERVAL);
    assert_eq!(status.remaining_seconds, INTERVAL);
    assert!(!status.cycle_running);
    assert_eq!(status.cycles_completed, 0);
}

#[tokio::test]
async fn start_and_stop_log_once_each() {
    let h = harness(TestBackends::new().backends(), &[]);

    assert!(h.scheduler.start().await);
    assert!(!h.scheduler.start().await);
    assert_eq!(h.scheduler.status().await.mode, SchedulerMode::Running);

    assert!(h.scheduler.stop().await);
    assert!(!h.scheduler.stop().await);
    assert_eq!(h.scheduler.status().await.mode, SchedulerMode::Paused);

    let messages: Vec<_> = h.entries().await.into_iter().map(|e| e.message).collect();
    assert_eq!(
        messages,
        vec!["System started. Auto-monitoring active.", "System paused by user."]
    );
}

#[tokio::test]
async fn tick_is_idle_while_paused() {
    let h = harness(TestBackends::new().backends(), &["natgeo"]);

    assert!(matches!(h.scheduler.tick(secs(INTERVAL)).await, TickOutcome::Idle));
    assert_eq!(h.scheduler.status().await.remaining_seconds, INTERVAL);
}

#[tokio::test]
async fn tick_counts_down_then_dispatches() {
    let backends = TestBackends::new();
    let h = harness(backends.backends(), &["natgeo"]);
    h.scheduler.start().await;

    match h.scheduler.tick(secs(1)).await {
        TickOutcome::Counting { remaining_seconds } => assert_eq!(remaining_seconds, INTERVAL - 1),
        other => panic!("expected counting, got {other:?}"),
    }

    let TickOutcome::Dispatched(handle) = h.scheduler.tick(secs(INTERVAL)).await else {
        panic!("expected a dispatched cycle");
    };
    let report = handle.await.unwrap();

    assert_eq!(report.accounts_checked, 1);
    assert_eq!(backends.source.calls(), vec!["natgeo"]);

    let status = h.scheduler.status().await;
    assert_eq!(status.remaining_seconds, INTERVAL);
    assert_eq!(status.cycles_completed, 1);
    assert!(!status.cycle_running);
    assert!(status.last_cycle_started_at.is_some());
    assert!(status.last_cycle_finished_at.is_some());
}

#[tokio::test]
async fn manual_check_resets_countdown_in_either_mode() {
    let h = harness(TestBackends::new().backends(), &["natgeo"]);

    // paused
    completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(h.scheduler.status().await.remaining_seconds, INTERVAL);

    // running, part way through the countdown
    h.scheduler.start().await;
    h.scheduler.tick(secs(700)).await;
    assert_eq!(h.scheduler.status().await.remaining_seconds, INTERVAL - 700);

    completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(h.scheduler.status().await.remaining_seconds, INTERVAL);
    assert_eq!(h.scheduler.status().await.mode, SchedulerMode::Running);
}

// -----------------------------------------------------------------------
// interval changes
// -----------------------------------------------------------------------

#[tokio::test]
async fn out_of_range_interval_is_rejected_without_log_entry() {
    let h = harness(TestBackends::new().backends(), &[]);

    for bad in [0, 599, 7201] {
        let err = h.scheduler.set_interval(bad).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInterval { .. }));
    }
    assert_eq!(h.scheduler.status().await.interval_seconds, INTERVAL);
    assert!(h.entries().await.is_empty());
}

#[tokio::test]
async fn interval_change_leaves_running_countdown_alone() {
    let h = harness(TestBackends::new().backends(), &[]);
    h.scheduler.start().await;
    h.scheduler.tick(secs(100)).await;

    h.scheduler.set_interval(600).await.unwrap();

    let status = h.scheduler.status().await;
    assert_eq!(status.interval_seconds, 600);
    assert_eq!(status.remaining_seconds, INTERVAL - 100);

    // takes effect on the next reset
    completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(h.scheduler.status().await.remaining_seconds, 600);
}

// -----------------------------------------------------------------------
// cycles
// -----------------------------------------------------------------------

#[tokio::test]
async fn inactive_accounts_are_never_checked() {
    let backends = TestBackends::new();
    let h = harness(backends.backends(), &["natgeo", "techcrunch", "nasa", "broken"]);
    {
        let mut registry = h.registry.write().await;
        let techcrunch = h_id(&registry, "techcrunch");
        let broken = h_id(&registry, "broken");
        registry
            .set_status(techcrunch, AccountStatus::Paused)
            .unwrap();
        registry.set_status(broken, AccountStatus::Error).unwrap();
    }

    let report = completed(h.scheduler.trigger_manual_check().await);

    assert_eq!(report.accounts_checked, 2);
    assert_eq!(backends.source.calls(), vec!["natgeo", "nasa"]);
    assert!(h.account("techcrunch").await.unwrap().last_checked_at.is_none());
    assert!(h.account("natgeo").await.unwrap().last_checked_at.is_some());
}

fn h_id(registry: &AccountRegistry, handle: &str) -> crate::types::AccountId {
    registry
        .list()
        .into_iter()
        .find(|a| a.handle == handle)
        .unwrap()
        .id
}

#[tokio::test]
async fn cycle_is_framed_by_batch_entries() {
    let h = harness(TestBackends::new().backends(), &["natgeo", "nasa"]);

    completed(h.scheduler.trigger_manual_check().await);

    let log = h.entries().await;
    let first = log.first().unwrap();
    let last = log.last().unwrap();
    assert!(first.is_system());
    assert_eq!(first.action, LogAction::CheckStarted);
    assert_eq!(first.message, "Starting batch check for 2 users...");
    assert!(last.is_system());
    assert_eq!(last.action, LogAction::CheckCompleted);
    assert_eq!(last.message, "Batch check completed. Waiting for next cycle.");
}

#[tokio::test]
async fn empty_registry_runs_silently() {
    let backends = TestBackends::new();
    let h = harness(backends.backends(), &[]);

    let report = completed(h.scheduler.trigger_manual_check().await);

    assert_eq!(report.accounts_checked, 0);
    assert!(backends.source.calls().is_empty());
    assert!(h.entries().await.is_empty());
    assert_eq!(h.scheduler.status().await.cycles_completed, 1);
}

#[tokio::test]
async fn overlapping_cycles_are_skipped_and_logged() {
    let source = BlockingSource::new(vec![ContentItem::post("m1")]);
    let backends = TestBackends::new();
    let h = harness(
        Backends {
            source: source.clone(),
            ..backends.backends()
        },
        &["natgeo"],
    );
    h.scheduler.start().await;

    let scheduler = h.scheduler.clone();
    let first = tokio::spawn(async move { scheduler.trigger_manual_check().await });
    source.entered.notified().await;
    assert!(h.scheduler.status().await.cycle_running);

    // manual and automatic triggers both bounce off the running cycle
    assert_eq!(h.scheduler.trigger_manual_check().await, CycleDispatch::Skipped);
    assert!(matches!(
        h.scheduler.tick(secs(INTERVAL)).await,
        TickOutcome::Skipped
    ));
    assert_eq!(h.scheduler.status().await.remaining_seconds, INTERVAL);

    source.release.notify_one();
    let report = completed(first.await.unwrap());

    assert_eq!(report.items_archived, 1);
    assert_eq!(h.archive.read().await.len(), 1, "only the running cycle archived");
    assert_eq!(source.calls(), vec!["natgeo"]);

    let status = h.scheduler.status().await;
    assert_eq!(status.cycles_skipped, 2);
    assert_eq!(status.cycles_completed, 1);
    assert!(!status.cycle_running);

    let skips: Vec<_> = h
        .entries()
        .await
        .into_iter()
        .filter(|e| e.action == LogAction::Skipped)
        .collect();
    assert_eq!(skips.len(), 2);
    assert!(skips.iter().all(|e| e.is_system() && e.severity == Severity::Info));
}

#[tokio::test]
async fn removal_mid_cycle_is_applied() {
    let source = BlockingSource::new(vec![ContentItem::post("m1")]);
    let backends = TestBackends::new();
    let h = harness(
        Backends {
            source: source.clone(),
            ..backends.backends()
        },
        &["natgeo", "nasa"],
    );

    let scheduler = h.scheduler.clone();
    let cycle = tokio::spawn(async move { scheduler.trigger_manual_check().await });
    source.entered.notified().await;

    // natgeo is in flight, nasa has not started yet
    {
        let mut registry = h.registry.write().await;
        let ids: Vec<_> = registry.list().into_iter().map(|a| a.id).collect();
        for id in ids {
            assert!(registry.remove(id).is_some());
        }
    }
    source.release.notify_one();

    let report = completed(cycle.await.unwrap());
    assert_eq!(report.accounts_checked, 1);
    assert_eq!(source.calls(), vec!["natgeo"]);
    assert!(h.registry.read().await.is_empty());
    // the in-flight check's upload is kept
    assert_eq!(h.archive.read().await.len(), 1);
}

#[tokio::test]
async fn auth_required_parks_account_in_error() {
    let backends = TestBackends::new();
    backends.source.push(
        "natgeo",
        Err(SourceError::AuthRequired("session expired".into())),
    );
    let h = harness(backends.backends(), &["natgeo", "nasa"]);
    let mut events = h.log.subscribe();

    let report = completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(report.accounts_errored, 1);

    let natgeo = h.account("natgeo").await.unwrap();
    assert_eq!(natgeo.status, AccountStatus::Error);
    assert!(natgeo.last_checked_at.is_some());
    assert!(natgeo.last_error.unwrap().contains("session expired"));

    let log = h.entries().await;
    assert!(
        log.iter()
            .any(|e| e.is_system() && e.action == LogAction::Failed && e.message.contains("natgeo"))
    );

    let mut saw_status_change = false;
    while let Ok(event) = events.try_recv() {
        if let Event::AccountStatusChanged { status, .. } = event {
            assert_eq!(status, AccountStatus::Error);
            saw_status_change = true;
        }
    }
    assert!(saw_status_change);

    // later cycles leave it alone
    completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(backends.source.calls(), vec!["natgeo", "nasa", "nasa"]);
}

#[tokio::test]
async fn transient_source_errors_keep_account_active() {
    let backends = TestBackends::new();
    backends.source.push(
        "nasa",
        Err(SourceError::SourceUnavailable("timeout".into())),
    );
    let h = harness(backends.backends(), &["nasa"]);

    let report = completed(h.scheduler.trigger_manual_check().await);
    assert_eq!(report.accounts_errored, 1);

    let nasa = h.account("nasa").await.unwrap();
    assert_eq!(nasa.status, AccountStatus::Active);
    assert!(nasa.last_checked_at.is_some());
    assert!(nasa.last_error.is_some());

    // the next successful check clears the error
    completed(h.scheduler.trigger_manual_check().await);
    let nasa = h.account("nasa").await.unwrap();
    assert!(nasa.last_error.is_none());
    assert_eq!(backends.source.calls().len(), 2);
}

#[tokio::test]
async fn panicking_account_does_not_stop_the_cycle() {
    let backends = TestBackends::new();
    let h = harness(
        Backends {
            source: Arc::new(PanickingSource { panic_for: "natgeo" }),
            ..backends.backends()
        },
        &["natgeo", "nasa"],
    );

    let report = completed(h.scheduler.trigger_manual_check().await);

    assert_eq!(report.accounts_checked, 2);
    assert_eq!(report.accounts_errored, 1);
    assert!(!h.scheduler.status().await.cycle_running);

    let log = h.entries().await;
    assert!(log.iter().any(|e| e.is_system()
        && e.action == LogAction::Failed
        && e.message.contains("aborted unexpectedly")));
    // nasa still got its check
    assert!(
        log.iter()
            .any(|e| e.subject == "nasa" && e.action == LogAction::CheckCompleted)
    );
    assert!(h.account("natgeo").await.unwrap().last_error.is_some());
}

#[tokio::test]
async fn cancelled_cycle_stops_before_next_account() {
    let backends = TestBackends::new();
    let h = harness(backends.backends(), &["natgeo", "nasa"]);
    h.cancel.cancel();

    let report = completed(h.scheduler.trigger_manual_check().await);

    assert!(report.cancelled);
    assert_eq!(report.accounts_checked, 0);
    assert!(backends.source.calls().is_empty());
    let last = h.entries().await.pop().unwrap();
    assert_eq!(last.message, "Batch check interrupted by shutdown.");
}

#[tokio::test]
async fn no_content_scenario_across_three_accounts() {
    let backends = TestBackends::new();
    let h = harness(backends.backends(), &["natgeo", "nasa", "techcrunch"]);
    {
        let mut registry = h.registry.write().await;
        let techcrunch = h_id(&registry, "techcrunch");
        registry
            .set_status(techcrunch, AccountStatus::Paused)
            .unwrap();
    }

    completed(h.scheduler.trigger_manual_check().await);

    let started: Vec<_> = h
        .entries()
        .await
        .into_iter()
        .filter(|e| !e.is_system() && e.action == LogAction::CheckStarted)
        .map(|e| e.subject)
        .collect();
    assert_eq!(started, vec!["natgeo", "nasa"]);
    assert!(h.archive.read().await.is_empty());
    assert_eq!(h.scheduler.status().await.remaining_seconds, 1800);
}
