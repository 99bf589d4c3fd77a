//! Per-account check, download and archive pipeline
//!
//! [`FetchPipeline::run`] handles one account from start to finish:
//! - ask the [`ContentSource`] whether anything is new
//! - for each reported item: skip it if already archived, download it, store it
//! - record every step in the event log
//!
//! Failures are isolated per item. A download or upload that still fails after the
//! configured retries costs that item only; the rest of the stream is processed. Source
//! failures end the account's check and are handed back to the scheduler, which decides
//! what happens to the account.

pub mod naming;


use crate::archive_index::ArchiveIndex;
use crate::config::{Config, RetryConfig};
use crate::error::{Result, SourceError};
use crate::event_log::LogWriter;
use crate::media::{HttpMediaFetcher, MediaFetcher};
use crate::retry::with_retry;
use crate::sink::ArchiveSink;
use crate::source::{ContentCheck, ContentItem, ContentSource};
use crate::types::{Account, Event, LogAction, Severity};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// The pluggable capabilities an archiver runs against
#[derive(Clone)]
pub struct Backends {
    /// Discovers new content
    pub source: Arc<dyn ContentSource>,
    /// Downloads media bytes
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Stores media durably
    pub sink: Arc<dyn ArchiveSink>,
}

impl Backends {
    /// Use the given source and sink with an [`HttpMediaFetcher`] built from `config.archive`
    pub fn new(
        config: &Config,
        source: Arc<dyn ContentSource>,
        sink: Arc<dyn ArchiveSink>,
    ) -> Result<Self> {
        let fetcher = HttpMediaFetcher::new(&config.archive)?;
        Ok(Self {
            source,
            fetcher: Arc::new(fetcher),
            sink,
        })
    }
}

/// Per-item counters for one account check
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemTally {
    /// Items the source reported
    pub found: usize,
    /// Items stored and indexed
    pub archived: usize,
    /// Items whose download or upload failed
    pub failed: usize,
    /// Items skipped as already archived
    pub skipped: usize,
    /// Whether shutdown abandoned the rest of the stream
    pub cancelled: bool,
}

/// How one account check ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source had nothing new
    NoNewContent,
    /// Items were processed (some may have failed)
    Completed(ItemTally),
    /// The source check itself failed
    Errored {
        /// What the source reported
        error: SourceError,
    },
}

/// Check/download/archive pipeline shared by every cycle
pub struct FetchPipeline {
    backends: Backends,
    archive: Arc<RwLock<ArchiveIndex>>,
    log: LogWriter,
    retry: RetryConfig,
}

impl FetchPipeline {
    /// Create a pipeline writing to the given archive index and log
    pub fn new(
        backends: Backends,
        archive: Arc<RwLock<ArchiveIndex>>,
        log: LogWriter,
        retry: RetryConfig,
    ) -> Self {
        Self {
            backends,
            archive,
            log,
            retry,
        }
    }

    /// Run one check for `account`
    ///
    /// Never fails: every problem is logged and summarized in the returned outcome. The
    /// cancellation token is observed between items.
    pub async fn run(&self, account: &Account, cancel: &CancellationToken) -> CycleOutcome {
        let handle = account.handle.as_str();

        self.log
            .record(
                handle,
                LogAction::CheckStarted,
                Severity::Info,
                "Checking for new updates...",
            )
            .await;

        let check = self.backends.source.check_for_new_content(handle).await;
        let mut stream = match check {
            Ok(ContentCheck::NewItems(stream)) => stream,
            Ok(ContentCheck::NoNewContent) => {
                self.log
                    .record(
                        handle,
                        LogAction::CheckCompleted,
                        Severity::Info,
                        "No new posts found.",
                    )
                    .await;
                return CycleOutcome::NoNewContent;
            }
            Err(error) => {
                tracing::warn!(
                    handle,
                    source = self.backends.source.name(),
                    error = %error,
                    "Content check failed"
                );
                self.log
                    .record(
                        handle,
                        LogAction::Failed,
                        Severity::Failure,
                        format!("Failed to check profile: {}", error),
                    )
                    .await;
                return CycleOutcome::Errored { error };
            }
        };

        let mut tally = ItemTally::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tally.cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };
            let Some(item) = next else {
                break;
            };

            tally.found += 1;
            self.process_item(handle, item, &mut tally).await;
        }

        let mut summary = format!(
            "Check completed: {} found, {} archived, {} failed, {} skipped",
            tally.found, tally.archived, tally.failed, tally.skipped
        );
        if tally.cancelled {
            summary.push_str(" (interrupted by shutdown)");
        }
        let severity = if tally.archived > 0 && tally.failed == 0 {
            Severity::Success
        } else {
            Severity::Info
        };
        self.log
            .record(handle, LogAction::CheckCompleted, severity, summary)
            .await;

        tracing::info!(
            handle,
            found = tally.found,
            archived = tally.archived,
            failed = tally.failed,
            skipped = tally.skipped,
            cancelled = tally.cancelled,
            "Account check finished"
        );

        CycleOutcome::Completed(tally)
    }

    async fn process_item(&self, handle: &str, item: ContentItem, tally: &mut ItemTally) {
        let kind = item.media_kind;

        if self
            .archive
            .read()
            .await
            .contains_media_ref(&item.media_ref)
        {
            tally.skipped += 1;
            self.log
                .record(
                    handle,
                    LogAction::Skipped,
                    Severity::Info,
                    format!("Already archived this {}, skipping.", kind),
                )
                .await;
            return;
        }

        self.log
            .record(
                handle,
                LogAction::ItemFound,
                Severity::Info,
                format!("Found new {}! Downloading...", kind),
            )
            .await;

        let fetcher = &self.backends.fetcher;
        let media = match with_retry(&self.retry, || fetcher.fetch(&item.media_ref)).await {
            Ok(media) => media,
            Err(e) => {
                tally.failed += 1;
                tracing::warn!(
                    handle,
                    media_ref = %item.media_ref,
                    error = %e,
                    "Media download failed"
                );
                self.log
                    .record(
                        handle,
                        LogAction::Failed,
                        Severity::Failure,
                        format!("Failed to download {}: {}", kind, e),
                    )
                    .await;
                return;
            }
        };

        self.log
            .record(
                handle,
                LogAction::Downloaded,
                Severity::Info,
                format!("Downloaded {} ({} bytes)", kind, media.bytes.len()),
            )
            .await;

        let name = naming::suggested_name(handle, kind, Utc::now(), &media);
        let sink = &self.backends.sink;
        let storage_ref = match with_retry(&self.retry, || sink.store(&media, &name)).await {
            Ok(storage_ref) => storage_ref,
            Err(e) => {
                tally.failed += 1;
                tracing::warn!(handle, name = %name, error = %e, "Archive upload failed");
                self.log
                    .record(
                        handle,
                        LogAction::Failed,
                        Severity::Failure,
                        format!("Failed to upload {}: {}", kind, e),
                    )
                    .await;
                return;
            }
        };

        self.log
            .record(
                handle,
                LogAction::Uploaded,
                Severity::Success,
                format!("Uploaded successfully to {} as {}", sink.name(), storage_ref),
            )
            .await;

        let archived = self.archive.write().await.append(
            handle,
            kind,
            &item.media_ref,
            storage_ref,
            item.caption,
        );
        tally.archived += 1;
        self.log.emit(Event::Archived { item: archived });
    }
}
