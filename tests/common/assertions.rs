//! Custom assertions and waiting helpers for integration tests

use social_archiver::{Archiver, Event, LogAction, LogEntry};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Wait until an event matching `predicate` arrives, or give up after `timeout`
pub async fn wait_for_event<F>(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    timeout: Duration,
    mut predicate: F,
) -> Option<Event>
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Every log entry, oldest first
pub async fn log_oldest_first(archiver: &Archiver) -> Vec<LogEntry> {
    let mut entries = archiver.list_recent_logs(usize::MAX).await;
    entries.reverse();
    entries
}

/// Subjects of the entries with `action`, oldest first
pub async fn subjects_with_action(archiver: &Archiver, action: LogAction) -> Vec<String> {
    log_oldest_first(archiver)
        .await
        .into_iter()
        .filter(|e| e.action == action)
        .map(|e| e.subject)
        .collect()
}

/// All regular files below `dir`, relative to it, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
    }

    let mut files = Vec::new();
    walk(dir, dir, &mut files);
    files.sort();
    files
}
