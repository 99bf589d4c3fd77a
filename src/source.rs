//! Content discovery capability
//!
//! A [`ContentSource`] answers one question per account: is there anything new? The
//! scraping and login machinery behind it is deliberately outside this crate.

use crate::error::SourceError;
use crate::types::MediaKind;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// One media unit reported by a source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
    /// Post or story
    pub media_kind: MediaKind,
    /// Caption text, if any
    pub caption: Option<String>,
    /// Reference the [`MediaFetcher`](crate::media::MediaFetcher) can resolve
    pub media_ref: String,
}

impl ContentItem {
    /// A post item without caption
    pub fn post(media_ref: impl Into<String>) -> Self {
        Self {
            media_kind: MediaKind::Post,
            caption: None,
            media_ref: media_ref.into(),
        }
    }

    /// A story item without caption
    pub fn story(media_ref: impl Into<String>) -> Self {
        Self {
            media_kind: MediaKind::Story,
            caption: None,
            media_ref: media_ref.into(),
        }
    }

    /// Attach a caption
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Lazy, finite sequence of new items; consumed once
pub type ItemStream = BoxStream<'static, ContentItem>;

/// Result of asking a source about one account
pub enum ContentCheck {
    /// Nothing new since the last check
    NoNewContent,
    /// New items, produced lazily
    NewItems(ItemStream),
}

impl ContentCheck {
    /// Wrap an already materialized list (an empty list means no new content)
    pub fn from_items(items: Vec<ContentItem>) -> Self {
        if items.is_empty() {
            ContentCheck::NoNewContent
        } else {
            ContentCheck::NewItems(stream::iter(items).boxed())
        }
    }
}

impl std::fmt::Debug for ContentCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentCheck::NoNewContent => f.write_str("NoNewContent"),
            ContentCheck::NewItems(_) => f.write_str("NewItems(..)"),
        }
    }
}

/// Pluggable "does this account have new content?" capability
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Check one account, identified by its normalized handle
    async fn check_for_new_content(&self, handle: &str) -> Result<ContentCheck, SourceError>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "content-source"
    }
}
