//! Top-level engine handle split into focused submodules.
//!
//! The `Archiver` struct and its methods are organized by domain:
//! - [`accounts`] - Adding, removing and toggling monitored accounts
//! - [`control`] - Scheduler control (start/stop, manual checks, interval)
//! - [`observe`] - Read-only snapshots for dashboards and the REST API
//! - [`services`] - Background clock task and API server starters
//! - [`lifecycle`] - Graceful shutdown

mod accounts;
mod control;
mod lifecycle;
mod observe;
mod services;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use crate::pipeline::Backends;

use crate::archive_index::ArchiveIndex;
use crate::config::Config;
use crate::error::Result;
use crate::event_log::{EventLog, LogWriter};
use crate::pipeline::FetchPipeline;
use crate::registry::AccountRegistry;
use crate::scheduler::Scheduler;
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Main archiver instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Archiver {
    /// Configuration the archiver was created with
    pub(crate) config: Arc<Config>,
    /// Monitored accounts
    pub(crate) registry: Arc<RwLock<AccountRegistry>>,
    /// Audit trail writer (also owns the event broadcast sender)
    pub(crate) log: LogWriter,
    /// Everything archived so far
    pub(crate) archive: Arc<RwLock<ArchiveIndex>>,
    /// Countdown and cycle execution
    pub(crate) scheduler: Scheduler,
    /// Cancelled once on shutdown; observed by the clock and by running cycles
    pub(crate) shutdown_token: CancellationToken,
    /// Handle of the one-second clock task, once spawned
    pub(crate) clock: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Archiver {
    /// Create a new archiver
    ///
    /// This validates the configuration, seeds the registry with the configured accounts
    /// (invalid handles are skipped with a warning) and, if `start_on_launch` is set,
    /// switches automatic monitoring on. The clock is not running yet; call
    /// [`spawn_clock`](Self::spawn_clock) for unattended operation.
    pub async fn new(config: Config, backends: Backends) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.log.event_channel_capacity);
        let log = LogWriter::new(
            Arc::new(RwLock::new(EventLog::new(config.log.log_retention_count))),
            event_tx,
        );

        let mut registry = AccountRegistry::new();
        let seeded = registry.seed(&config.accounts);
        let registry = Arc::new(RwLock::new(registry));
        let archive = Arc::new(RwLock::new(ArchiveIndex::new()));
        let shutdown_token = CancellationToken::new();

        tracing::info!(
            source = backends.source.name(),
            sink = backends.sink.name(),
            accounts = seeded.len(),
            interval_seconds = config.scheduler.check_interval_seconds,
            "Archiver initialized"
        );

        let pipeline = Arc::new(FetchPipeline::new(
            backends,
            archive.clone(),
            log.clone(),
            config.retry.clone(),
        ));
        let scheduler = Scheduler::new(
            config.scheduler.check_interval_seconds,
            registry.clone(),
            pipeline,
            log.clone(),
            shutdown_token.clone(),
        );

        let archiver = Self {
            config: Arc::new(config),
            registry,
            log,
            archive,
            scheduler,
            shutdown_token,
            clock: Arc::new(Mutex::new(None)),
        };

        if archiver.config.scheduler.start_on_launch {
            archiver.start().await;
        }

        Ok(archiver)
    }

    /// Subscribe to engine events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than `event_channel_capacity` events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.log.subscribe()
    }

    /// Get the configuration (cheap Arc clone)
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers; dropped silently when nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.log.emit(event);
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }
}
