//! Bounded audit trail
//!
//! [`EventLog`] is the append-only record shown to operators. [`LogWriter`] is the handle
//! the pipeline and scheduler write through: every append also goes out on the event
//! broadcast channel and is mirrored to `tracing` at debug level.

use crate::types::{Event, LogAction, LogEntry, SYSTEM_SUBJECT, Severity};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// FIFO-capped list of log entries
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    retention: usize,
    next_id: u64,
}

impl EventLog {
    /// Create a log that keeps at most `retention` entries (minimum 1)
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            entries: VecDeque::with_capacity(retention.min(1024)),
            retention,
            next_id: 0,
        }
    }

    /// Append an entry, evicting the oldest ones beyond the cap
    pub fn append(
        &mut self,
        subject: impl Into<String>,
        action: LogAction,
        severity: Severity,
        message: impl Into<String>,
    ) -> LogEntry {
        self.next_id += 1;
        let entry = LogEntry {
            id: self.next_id,
            timestamp: Utc::now(),
            subject: subject.into(),
            action,
            message: message.into(),
            severity,
        };
        self.entries.push_back(entry.clone());

        while self.entries.len() > self.retention {
            self.entries.pop_front();
        }
        entry
    }

    /// Up to `limit` most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// All retained entries, oldest first
    pub fn all(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cloneable writer shared by the pipeline, the scheduler and the archiver
#[derive(Clone)]
pub struct LogWriter {
    log: Arc<RwLock<EventLog>>,
    event_tx: broadcast::Sender<Event>,
}

impl LogWriter {
    /// Create a writer over a log and an event channel
    pub fn new(log: Arc<RwLock<EventLog>>, event_tx: broadcast::Sender<Event>) -> Self {
        Self { log, event_tx }
    }

    /// Append an entry and broadcast it
    pub async fn record(
        &self,
        subject: &str,
        action: LogAction,
        severity: Severity,
        message: impl Into<String>,
    ) -> LogEntry {
        let entry = self
            .log
            .write()
            .await
            .append(subject, action, severity, message);

        tracing::debug!(
            entry_id = entry.id,
            subject = %entry.subject,
            action = ?entry.action,
            severity = ?entry.severity,
            "{}",
            entry.message
        );

        self.emit(Event::Log {
            entry: entry.clone(),
        });
        entry
    }

    /// Append an entry about the engine itself
    pub async fn system(
        &self,
        action: LogAction,
        severity: Severity,
        message: impl Into<String>,
    ) -> LogEntry {
        self.record(SYSTEM_SUBJECT, action, severity, message).await
    }

    /// Broadcast an event; having no subscribers is fine
    pub fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Subscribe to the event channel
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The underlying log
    pub fn log(&self) -> &Arc<RwLock<EventLog>> {
        &self.log
    }
}
