//! Read-only snapshots of engine state.

use crate::types::{Account, ArchivedItem, LogEntry, SchedulerMode, SchedulerStatus, Stats};

use super::Archiver;

impl Archiver {
    /// All monitored accounts in insertion order
    pub async fn list_accounts(&self) -> Vec<Account> {
        self.registry.read().await.list()
    }

    /// Up to `limit` most recent log entries, newest first
    pub async fn list_recent_logs(&self, limit: usize) -> Vec<LogEntry> {
        self.log.log().read().await.recent(limit)
    }

    /// Every archived item, newest first
    pub async fn list_archived_items(&self) -> Vec<ArchivedItem> {
        self.archive.read().await.list()
    }

    /// Run mode, interval, countdown and cycle counters
    pub async fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    /// Dashboard overview
    pub async fn stats(&self) -> Stats {
        let (active_accounts, total_accounts) = {
            let registry = self.registry.read().await;
            (registry.active().len(), registry.len())
        };
        let archived_items = self.archive.read().await.len();
        let status = self.scheduler.status().await;

        Stats {
            active_accounts,
            total_accounts,
            archived_items,
            next_check_in_seconds: status.remaining_seconds,
            running: status.mode == SchedulerMode::Running,
        }
    }
}
