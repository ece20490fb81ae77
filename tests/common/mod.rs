//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use reelbot::adapters::{
    ContentFeed, FeedError, FeedPage, FetchError, MediaFetcher, MediaPublisher, PublishError,
    PublishReceipt,
};
use reelbot::core::{Pacer, PauseKind};
use reelbot::domain::{ContentItem, MediaKind};

/// Video posted `hours` ago with the given id and like count
pub fn video(id: &str, hours: i64, likes: u64) -> ContentItem {
    item_at(id, Utc::now() - ChronoDuration::hours(hours), likes, MediaKind::Video)
}

pub fn item_at(id: &str, created_at: DateTime<Utc>, likes: u64, kind: MediaKind) -> ContentItem {
    ContentItem::new(
        id,
        created_at,
        likes,
        kind,
        format!("https://cdn.example/{}.mp4", id),
    )
}

/// Feed serving fixed pages; the cursor is the next page index
#[derive(Default)]
pub struct PagedFeed {
    pages: Vec<Vec<ContentItem>>,
    pub requests: Mutex<usize>,
}

impl PagedFeed {
    pub fn new(pages: Vec<Vec<ContentItem>>) -> Self {
        Self {
            pages,
            requests: Mutex::new(0),
        }
    }

    pub fn single(items: Vec<ContentItem>) -> Self {
        Self::new(vec![items])
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

#[async_trait]
impl ContentFeed for PagedFeed {
    fn name(&self) -> &str {
        "paged"
    }

    async fn next_page(&self, cursor: Option<&str>) -> Result<FeedPage, FeedError> {
        *self.requests.lock().unwrap() += 1;

        let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };

        Ok(FeedPage { items, next_cursor })
    }
}

/// Feed that always fails
pub struct BrokenFeed;

#[async_trait]
impl ContentFeed for BrokenFeed {
    fn name(&self) -> &str {
        "broken"
    }

    async fn next_page(&self, _cursor: Option<&str>) -> Result<FeedPage, FeedError> {
        Err(FeedError::Transport("connection reset".into()))
    }
}

/// Writes `<id>.mp4` plus a thumbnail, or fails for selected ids
#[derive(Default)]
pub struct StubFetcher {
    failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn failing(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch(
        &self,
        item: &ContentItem,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, FetchError> {
        self.calls.lock().unwrap().push(item.id.clone());

        if self.failing.contains(&item.id) {
            return Err(FetchError::External {
                item_id: item.id.clone(),
                reason: "content deleted".into(),
            });
        }

        let video = dest_dir.join(format!("{}.mp4", item.id));
        let thumb = dest_dir.join(format!("{}.jpg", item.id));
        std::fs::write(&video, item.id.as_bytes()).unwrap();
        std::fs::write(&thumb, b"jpg").unwrap();
        Ok(vec![thumb, video])
    }
}

/// A publish call as the publisher saw it
#[derive(Debug, Clone)]
pub struct PublishCall {
    /// Contents of the uploaded file (the item id written by StubFetcher)
    pub item_id: String,
    pub file_name: String,
    pub caption: String,
}

/// Records publish calls; fails the calls whose 1-based index is listed
#[derive(Default)]
pub struct RecordingPublisher {
    failing_calls: HashSet<usize>,
    pub calls: Mutex<Vec<PublishCall>>,
}

impl RecordingPublisher {
    pub fn failing_calls(calls: &[usize]) -> Self {
        Self {
            failing_calls: calls.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn published_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.item_id).collect()
    }
}

#[async_trait]
impl MediaPublisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&self, path: &Path, caption: &str) -> Result<PublishReceipt, PublishError> {
        let contents = std::fs::read_to_string(path).unwrap();
        let call = PublishCall {
            item_id: contents.clone(),
            file_name: path.file_name().unwrap().to_string_lossy().to_string(),
            caption: caption.to_string(),
        };

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };

        if self.failing_calls.contains(&index) {
            return Err(PublishError::Transport("rate limited".into()));
        }

        Ok(PublishReceipt {
            media_id: format!("published-{}", contents),
        })
    }
}

/// Records pauses instead of sleeping
#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Mutex<Vec<(PauseKind, Duration)>>,
}

impl RecordingPacer {
    pub fn kinds(&self) -> Vec<PauseKind> {
        self.pauses.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        self.pauses.lock().unwrap().push((kind, duration));
    }
}
