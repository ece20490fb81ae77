//! Scratch directory for downloaded media.
//!
//! The directory is created at startup if absent and is wiped and recreated
//! on cleanup. Files inside it never outlive a run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::domain::ContentItem;

/// Default staging directory, relative to the working directory
pub const DEFAULT_STAGING_DIR: &str = "temp_downloads";

/// Errors from managing the staging directory
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging directory {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clean staging directory {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to inspect staging directory {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process-wide scratch directory
#[derive(Debug, Clone)]
pub struct StagingDir {
    root: PathBuf,
}

impl StagingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet
    pub async fn init(&self) -> Result<(), StagingError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StagingError::Create {
                path: self.root.clone(),
                source,
            })?;
        debug!(dir = %self.root.display(), "Staging directory ready");
        Ok(())
    }

    /// Remove everything in the directory and recreate it empty.
    ///
    /// Idempotent: calling it on an empty or missing directory leaves an
    /// empty directory behind.
    pub async fn cleanup(&self) -> Result<(), StagingError> {
        let exists = fs::try_exists(&self.root)
            .await
            .map_err(|source| StagingError::Inspect {
                path: self.root.clone(),
                source,
            })?;

        if exists {
            let removed = self.entries().await?.len();
            fs::remove_dir_all(&self.root)
                .await
                .map_err(|source| StagingError::Clean {
                    path: self.root.clone(),
                    source,
                })?;
            info!(dir = %self.root.display(), removed, "Cleaned staging directory");
        }

        self.init().await
    }

    /// List the entries currently in the directory
    pub async fn entries(&self) -> Result<Vec<PathBuf>, StagingError> {
        let inspect = |source| StagingError::Inspect {
            path: self.root.clone(),
            source,
        };

        let mut dir = fs::read_dir(&self.root).await.map_err(inspect)?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(inspect)? {
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// Destination path for an item's video.
    ///
    /// Named after the item's creation time. Falls back to appending the item
    /// id when another item from this run already took that name.
    pub async fn staged_path_for(&self, item: &ContentItem) -> PathBuf {
        let stem = item.staged_stem();
        let primary = self.root.join(format!("{}.mp4", stem));
        if !fs::try_exists(&primary).await.unwrap_or(false) {
            return primary;
        }
        self.root.join(format!("{}_{}.mp4", stem, item.id))
    }
}
