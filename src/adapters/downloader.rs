//! Downloader adapter: fetch an item's media into staging under a
//! deterministic name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use super::{FetchError, MediaFetcher};
use crate::core::staging::StagingDir;
use crate::domain::{ContentItem, StagedFile};

/// Wraps the external fetcher with staging-directory bookkeeping
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn MediaFetcher>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { fetcher }
    }

    /// Download `item` into `staging` and rename the video to its staged name.
    ///
    /// Only the paths the fetcher reports are considered. On success exactly
    /// one new file remains in the directory; any other reported outputs are
    /// removed.
    pub async fn fetch_to_staging(
        &self,
        item: &ContentItem,
        staging: &StagingDir,
    ) -> Result<StagedFile, FetchError> {
        info!(item_id = %item.id, fetcher = self.fetcher.name(), "Downloading");

        let outputs = self.fetcher.fetch(item, staging.path()).await?;
        debug!(item_id = %item.id, outputs = outputs.len(), "Fetcher reported outputs");

        let Some(video) = pick_video(&outputs) else {
            discard(&outputs).await;
            return Err(FetchError::NoVideo {
                item_id: item.id.clone(),
            });
        };

        let extras: Vec<PathBuf> = outputs
            .iter()
            .filter(|p| p.as_path() != video)
            .cloned()
            .collect();
        discard(&extras).await;

        let target = staging.staged_path_for(item).await;
        if video != target.as_path() {
            if let Err(source) = fs::rename(video, &target).await {
                discard(&[video.to_path_buf()]).await;
                return Err(FetchError::Rename {
                    from: video.to_path_buf(),
                    source,
                });
            }
        }

        info!(item_id = %item.id, path = %target.display(), "Downloaded");
        Ok(StagedFile::new(item.id.clone(), target))
    }
}

/// First reported path with an `.mp4` extension
fn pick_video(outputs: &[PathBuf]) -> Option<&Path> {
    outputs
        .iter()
        .find(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("mp4"))
                .unwrap_or(false)
        })
        .map(PathBuf::as_path)
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove side output");
            }
        }
    }
}
