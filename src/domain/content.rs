//! Content items discovered on a profile feed, and what becomes of them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media behind a feed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A video (reel or feed video)
    Video,

    /// Anything else (image, carousel album)
    Other,
}

/// One piece of discoverable media, as reported by the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform identifier of the post
    pub id: String,

    /// When the post was created
    pub created_at: DateTime<Utc>,

    /// Like count at fetch time
    pub engagement: u64,

    /// Kind of media
    pub kind: MediaKind,

    /// Locator the fetcher uses to retrieve the media (usually a CDN URL)
    pub media_url: String,

    /// Public link to the post, for logging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
}

impl ContentItem {
    /// Create a new content item
    pub fn new(
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        engagement: u64,
        kind: MediaKind,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            engagement,
            kind,
            media_url: media_url.into(),
            permalink: None,
        }
    }

    /// Attach a permalink
    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = Some(permalink.into());
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Deterministic staging file stem: `YYYY-MM-DD_HH-MM-SS` in UTC
    pub fn staged_stem(&self) -> String {
        self.created_at.format("%Y-%m-%d_%H-%M-%S").to_string()
    }
}

/// A content item that passed selection, with its rank key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub item: ContentItem,

    /// Engagement count the candidate was ranked by
    pub rank: u64,
}

impl Candidate {
    pub fn new(item: ContentItem) -> Self {
        let rank = item.engagement;
        Self { item, rank }
    }
}

/// A downloaded video sitting in the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Id of the content item this file was fetched from
    pub item_id: String,

    path: PathBuf,
}

impl StagedFile {
    pub fn new(item_id: impl Into<String>, path: PathBuf) -> Self {
        Self {
            item_id: item_id.into(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
