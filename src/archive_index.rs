//! Materialized index of archived items

use crate::types::{ArchivedItem, MediaKind, StorageRef};
use chrono::Utc;
use std::collections::HashSet;

/// Every item the sink has accepted, in archive order
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    items: Vec<ArchivedItem>,
    media_refs: HashSet<String>,
    next_id: u64,
}

impl ArchiveIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored item
    pub fn append(
        &mut self,
        source_handle: &str,
        media_kind: MediaKind,
        media_ref: &str,
        storage_ref: StorageRef,
        caption: Option<String>,
    ) -> ArchivedItem {
        self.next_id += 1;
        let item = ArchivedItem {
            id: self.next_id,
            source_handle: source_handle.to_string(),
            media_kind,
            media_ref: media_ref.to_string(),
            storage_ref,
            caption,
            archived_at: Utc::now(),
        };
        self.media_refs.insert(item.media_ref.clone());
        self.items.push(item.clone());
        item
    }

    /// Whether media with this source reference was already archived
    pub fn contains_media_ref(&self, media_ref: &str) -> bool {
        self.media_refs.contains(media_ref)
    }

    /// All items, newest first
    pub fn list(&self) -> Vec<ArchivedItem> {
        self.items.iter().rev().cloned().collect()
    }

    /// Number of archived items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been archived yet
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
