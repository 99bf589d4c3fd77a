use super::test_helpers::*;
use super::*;
use crate::error::{Error, SourceError};
use crate::scheduler::{CycleDispatch, TickOutcome};
use crate::source::ContentItem;
use crate::types::{AccountStatus, LogAction, SchedulerMode, Severity};
use std::time::Duration;


/// Drain every event currently buffered for `rx`
fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn new_seeds_configured_accounts_in_order() {
    let (archiver, _backends) = create_test_archiver(&["@natgeo", " nasa ", "   "]).await;

    let handles: Vec<String> = archiver
        .list_accounts()
        .await
        .into_iter()
        .map(|a| a.handle)
        .collect();
    assert_eq!(handles, vec!["natgeo", "nasa"]);
}

#[tokio::test]
async fn new_rejects_out_of_range_interval() {
    let backends = TestBackends::new();
    let mut config = test_config(&[]);
    config.scheduler.check_interval_seconds = 60;

    let result = Archiver::new(config, backends.backends()).await;
    assert!(matches!(
        result,
        Err(Error::InvalidInterval { seconds: 60, .. })
    ));
}

#[tokio::test]
async fn new_rejects_zero_log_retention() {
    let backends = TestBackends::new();
    let mut config = test_config(&[]);
    config.log.log_retention_count = 0;

    let result = Archiver::new(config, backends.backends()).await;
    match result {
        Err(Error::Config { key, .. }) => {
            assert_eq!(key.as_deref(), Some("log_retention_count"));
        }
        other => panic!("expected a config error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn new_starts_paused_unless_configured() {
    let (archiver, _backends) = create_test_archiver(&[]).await;
    assert_eq!(archiver.scheduler_status().await.mode, SchedulerMode::Paused);

    let backends = TestBackends::new();
    let mut config = test_config(&[]);
    config.scheduler.start_on_launch = true;
    let archiver = Archiver::new(config, backends.backends()).await.unwrap();
    assert_eq!(archiver.scheduler_status().await.mode, SchedulerMode::Running);
}

#[tokio::test]
async fn get_config_returns_shared_config() {
    let (archiver, _backends) = create_test_archiver(&["a"]).await;
    let config = archiver.get_config();
    assert_eq!(config.accounts, vec!["a".to_string()]);
    assert!(Arc::ptr_eq(&config, &archiver.get_config()));
}

#[tokio::test]
async fn clones_share_state() {
    let (archiver, _backends) = create_test_archiver(&[]).await;
    let clone = archiver.clone();

    clone.add_account("shared").await.unwrap();
    assert_eq!(archiver.list_accounts().await.len(), 1);
}
