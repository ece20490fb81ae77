//! Adapter interfaces for external systems.
//!
//! The platform does the real work: authentication, serving the content
//! feed, handing out media and accepting uploads. reelbot only sees it
//! through the three collaborator traits below. The Downloader and
//! Publisher adapters wrap those traits with the local file handling the
//! orchestrator relies on.

pub mod downloader;
pub mod instagram;
pub mod publisher;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ContentItem;

// Re-export the adapters
pub use downloader::Downloader;
pub use instagram::{InstagramClient, InstagramConfig};
pub use publisher::{Publisher, DEFAULT_CAPTION};

/// Error payload returned by a platform API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub code: Option<i64>,
    pub message: String,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Login or session failure
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login request failed: {0}")]
    Transport(String),

    #[error("Login rejected: {0}")]
    Rejected(ApiFailure),

    #[error("Token belongs to '{actual}', expected '{expected}'")]
    AccountMismatch { expected: String, actual: String },
}

/// Failure while reading the content feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Transport(String),

    #[error("Feed API error: {0}")]
    Api(ApiFailure),

    #[error("Malformed feed response: {0}")]
    Malformed(String),
}

/// Failure to bring one item's media into the staging directory
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Download of item {item_id} failed: {reason}")]
    External { item_id: String, reason: String },

    #[error("No video file among the outputs for item {item_id}")]
    NoVideo { item_id: String },

    #[error("Failed to move {} into place: {source}", from.display())]
    Rename {
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to publish one staged file
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Staged file {} is missing", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read staged file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Publish request failed: {0}")]
    Transport(String),

    #[error("Publish API error: {0}")]
    Api(ApiFailure),

    #[error("Upload container {container_id} ended in status {status}")]
    Rejected {
        container_id: String,
        status: String,
    },

    #[error("Upload container {container_id} still processing after {polls} status checks")]
    ProcessingTimeout { container_id: String, polls: u32 },
}

/// One page of a profile's content feed
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub items: Vec<ContentItem>,

    /// Opaque cursor for the next page; `None` ends the feed
    pub next_cursor: Option<String>,
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Platform id of the newly published media
    pub media_id: String,
}

/// Paginated, reverse-chronological (not guaranteed) content feed of a profile
#[async_trait]
pub trait ContentFeed: Send + Sync {
    /// Human-readable collaborator name
    fn name(&self) -> &str;

    /// Fetch one page. `None` requests the first page.
    async fn next_page(&self, cursor: Option<&str>) -> Result<FeedPage, FeedError>;
}

/// External fetch-by-reference capability
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Download the item's media into `dest_dir`, returning every path written
    async fn fetch(
        &self,
        item: &ContentItem,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, FetchError>;
}

/// External publish-by-local-file capability
#[async_trait]
pub trait MediaPublisher: Send + Sync {
    fn name(&self) -> &str;

    /// Upload a local video and publish it with the given caption
    async fn publish(&self, path: &Path, caption: &str) -> Result<PublishReceipt, PublishError>;
}
