//! # social-archiver
//!
//! Unattended monitoring and archival engine for social-media accounts.
//!
//! A registry of handles is checked on a countdown. New media found by a
//! [`ContentSource`] is downloaded by a [`MediaFetcher`] and stored through an
//! [`ArchiveSink`]; every step is written to a bounded event log and broadcast as an
//! [`Event`]. The REST API in [`api`] is an optional surface over the same engine.
//!
//! ## Quick Start
//!
//! ```no_run
//! use social_archiver::{Archiver, Backends, Config, LocalDirSink};
//! use social_archiver::source::{ContentCheck, ContentSource};
//! use social_archiver::error::SourceError;
//! use std::sync::Arc;
//!
//! struct MyScraper;
//!
//! #[async_trait::async_trait]
//! impl ContentSource for MyScraper {
//!     async fn check_for_new_content(&self, _handle: &str) -> Result<ContentCheck, SourceError> {
//!         Ok(ContentCheck::NoNewContent)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         accounts: vec!["natgeo".to_string(), "@nasa".to_string()],
//!         ..Default::default()
//!     };
//!
//!     let sink = Arc::new(LocalDirSink::new(config.archive.archive_dir.clone()));
//!     let backends = Backends::new(&config, Arc::new(MyScraper), sink)?;
//!     let archiver = Archiver::new(config, backends).await?;
//!
//!     let mut events = archiver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     archiver.start().await;
//!     archiver.spawn_clock().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Materialized index of archived items
pub mod archive_index;
/// Engine handle tying the registry, scheduler and pipeline together
pub mod archiver;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Bounded audit trail
pub mod event_log;
/// Media download capability
pub mod media;
/// Per-account check/download/archive pipeline
pub mod pipeline;
/// Monitored account registry
pub mod registry;
/// Bounded retries for downloads and uploads
pub mod retry;
/// Countdown-driven cycle scheduler
pub mod scheduler;
/// Archive storage capability
pub mod sink;
/// Content discovery capability
pub mod source;
/// Core types and events
pub mod types;

pub use archiver::{Archiver, Backends};
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, FetchError, Result, SinkError, SourceError};
pub use media::{DownloadedMedia, HttpMediaFetcher, MediaFetcher};
pub use scheduler::{CycleDispatch, Scheduler, TickOutcome};
pub use sink::{ArchiveSink, LocalDirSink};
pub use source::{ContentCheck, ContentItem, ContentSource};
pub use types::{
    Account, AccountId, AccountStatus, ArchivedItem, CycleReport, Event, LogAction, LogEntry,
    MediaKind, SchedulerMode, SchedulerStatus, Severity, Stats, StorageRef,
};

/// Run until the process is asked to stop, then shut the archiver down
///
/// Stops on SIGTERM or SIGINT on Unix and on Ctrl+C elsewhere.
///
/// ```no_run
/// use social_archiver::{Archiver, run_with_shutdown};
///
/// # async fn example(archiver: Archiver) -> Result<(), Box<dyn std::error::Error>> {
/// archiver.start().await;
/// archiver.spawn_clock().await;
/// run_with_shutdown(archiver).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(archiver: Archiver) -> Result<()> {
    let signal = termination_signal().await;
    tracing::info!(signal, "Stop requested, shutting down archiver");
    archiver.shutdown().await
}

/// Resolve with the name of the first termination signal received
#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; fall back to Ctrl+C alone
    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Signal registration failed, listening for Ctrl+C only");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C");
    }
    "ctrl-c"
}
