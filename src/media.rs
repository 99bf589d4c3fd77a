//! Media download capability
//!
//! [`MediaFetcher`] turns a source's media reference into bytes. [`HttpMediaFetcher`]
//! handles `http(s)://` references with reqwest. `file://` references are only followed
//! below an explicitly configured local root, since references come from scraped content.

use crate::config::ArchiveConfig;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

/// Bytes behind one media reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedMedia {
    /// The reference that was fetched
    pub media_ref: String,
    /// Raw content
    pub bytes: Vec<u8>,
    /// MIME type reported by the origin, if any
    pub content_type: Option<String>,
}

impl DownloadedMedia {
    /// File extension for the content (falls back to the reference's extension, then `jpg`)
    pub fn extension(&self) -> &'static str {
        let from_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .and_then(|ct| match ct.as_str() {
                "image/jpeg" | "image/jpg" => Some("jpg"),
                "image/png" => Some("png"),
                "image/webp" => Some("webp"),
                "image/gif" => Some("gif"),
                "video/mp4" => Some("mp4"),
                _ => None,
            });

        from_type
            .or_else(|| extension_from_ref(&self.media_ref))
            .unwrap_or("jpg")
    }
}

fn extension_from_ref(media_ref: &str) -> Option<&'static str> {
    let path = media_ref.split(['?', '#']).next()?;
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "mp4" => Some("mp4"),
        _ => None,
    }
}

/// Pluggable media download capability
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the content behind `media_ref`
    async fn fetch(&self, media_ref: &str) -> std::result::Result<DownloadedMedia, FetchError>;
}

/// reqwest-backed fetcher for `http(s)://` and opted-in `file://` references
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    max_bytes: u64,
    local_root: Option<PathBuf>,
}

impl HttpMediaFetcher {
    /// Build a fetcher from the archive settings (timeout, User-Agent, size cap, local root)
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_media_bytes,
            local_root: config.local_media_root.clone(),
        })
    }

    fn too_large(&self, media_ref: &str) -> FetchError {
        FetchError::TooLarge {
            media_ref: media_ref.to_string(),
            limit: self.max_bytes,
        }
    }

    async fn fetch_http(
        &self,
        url: Url,
        media_ref: &str,
    ) -> std::result::Result<DownloadedMedia, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                media_ref: media_ref.to_string(),
            });
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(self.too_large(media_ref));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Content-Length can be absent or wrong, so the cap is enforced per chunk too
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large(media_ref));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(media_ref, size = bytes.len(), "Media downloaded");
        Ok(DownloadedMedia {
            media_ref: media_ref.to_string(),
            bytes,
            content_type,
        })
    }

    async fn fetch_file(
        &self,
        url: Url,
        media_ref: &str,
    ) -> std::result::Result<DownloadedMedia, FetchError> {
        let invalid = || FetchError::InvalidReference(media_ref.to_string());

        let Some(root) = &self.local_root else {
            tracing::warn!(media_ref, "Refusing file reference, no local media root configured");
            return Err(invalid());
        };
        let path = url.to_file_path().map_err(|_| invalid())?;
        let root = tokio::fs::canonicalize(root).await?;
        let path = tokio::fs::canonicalize(&path).await?;
        if !path.starts_with(&root) {
            tracing::warn!(media_ref, root = %root.display(), "File reference escapes local media root");
            return Err(invalid());
        }

        if tokio::fs::metadata(&path).await?.len() > self.max_bytes {
            return Err(self.too_large(media_ref));
        }
        let bytes = tokio::fs::read(&path).await?;

        Ok(DownloadedMedia {
            media_ref: media_ref.to_string(),
            bytes,
            content_type: None,
        })
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, media_ref: &str) -> std::result::Result<DownloadedMedia, FetchError> {
        let url = Url::parse(media_ref)
            .map_err(|_| FetchError::InvalidReference(media_ref.to_string()))?;

        match url.scheme() {
            "http" | "https" => self.fetch_http(url, media_ref).await,
            "file" => self.fetch_file(url, media_ref).await,
            _ => Err(FetchError::InvalidReference(media_ref.to_string())),
        }
    }
}
