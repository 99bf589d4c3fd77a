//! Fixtures: a scripted content source, a media server and engine construction

use async_trait::async_trait;
use social_archiver::source::{ContentCheck, ContentItem, ContentSource};
use social_archiver::{Archiver, Backends, Config, LocalDirSink, SourceError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bytes the media server serves for `name` (distinct per image)
pub fn image_bytes(name: &str) -> Vec<u8> {
    let mut bytes = b"\xff\xd8\xff\xe0".to_vec();
    bytes.extend_from_slice(name.as_bytes());
    bytes
}

type Answer = Result<Vec<ContentItem>, SourceError>;

/// Scraper stand-in answering from per-handle queues
///
/// Handles with nothing queued report no new content.
#[derive(Default)]
pub struct ScriptedScraper {
    answers: Mutex<HashMap<String, VecDeque<Answer>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedScraper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue(&self, handle: &str, answer: Answer) {
        self.answers
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default()
            .push_back(answer);
    }

    /// Handles checked so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for ScriptedScraper {
    async fn check_for_new_content(&self, handle: &str) -> Result<ContentCheck, SourceError> {
        self.calls.lock().unwrap().push(handle.to_string());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .get_mut(handle)
            .and_then(VecDeque::pop_front);

        match answer {
            Some(Ok(items)) => Ok(ContentCheck::from_items(items)),
            Some(Err(e)) => Err(e),
            None => Ok(ContentCheck::NoNewContent),
        }
    }

    fn name(&self) -> &str {
        "scripted-scraper"
    }
}

/// Start a media server answering `GET /media/{name}` for every name in `images`
pub async fn media_server(images: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    for name in images {
        Mock::given(method("GET"))
            .and(path(format!("/media/{}", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(image_bytes(name)),
            )
            .mount(&server)
            .await;
    }
    server
}

/// Config writing into `archive_dir`, with short retry delays
pub fn test_config(archive_dir: &TempDir, accounts: &[&str]) -> Config {
    let mut config = Config {
        accounts: accounts.iter().map(|a| a.to_string()).collect(),
        ..Default::default()
    };
    config.archive.archive_dir = archive_dir.path().to_path_buf();
    config.archive.fetch_timeout = Duration::from_secs(5);
    config.retry.max_attempts = 2;
    config.retry.initial_delay = Duration::from_millis(10);
    config.retry.max_delay = Duration::from_millis(20);
    config.retry.jitter = false;
    config
}

/// An engine with the real HTTP fetcher and a local-directory sink
pub async fn create_archiver(
    accounts: &[&str],
) -> (Archiver, Arc<ScriptedScraper>, TempDir) {
    let archive_dir = TempDir::new().unwrap();
    let config = test_config(&archive_dir, accounts);
    let scraper = ScriptedScraper::new();
    let sink = Arc::new(LocalDirSink::new(archive_dir.path()));
    let backends = Backends::new(&config, scraper.clone(), sink).unwrap();
    let archiver = Archiver::new(config, backends).await.unwrap();
    (archiver, scraper, archive_dir)
}
