//! Publisher adapter: republish a staged video with a caption.

use std::sync::Arc;

use tokio::fs;
use tracing::info;

use super::{MediaPublisher, PublishError, PublishReceipt};
use crate::domain::StagedFile;

/// Caption used when none is configured
pub const DEFAULT_CAPTION: &str = "🔥 Trending Reel #repost";

/// Wraps the external publisher. Never retries.
#[derive(Clone)]
pub struct Publisher {
    publisher: Arc<dyn MediaPublisher>,
    default_caption: String,
}

impl Publisher {
    pub fn new(publisher: Arc<dyn MediaPublisher>) -> Self {
        Self {
            publisher,
            default_caption: DEFAULT_CAPTION.to_string(),
        }
    }

    /// Replace the caption used when `publish` gets `None`
    pub fn with_default_caption(mut self, caption: impl Into<String>) -> Self {
        self.default_caption = caption.into();
        self
    }

    pub async fn publish(
        &self,
        file: &StagedFile,
        caption: Option<&str>,
    ) -> Result<PublishReceipt, PublishError> {
        let path = file.path();
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(PublishError::MissingFile(path.to_path_buf()));
        }

        let caption = caption.unwrap_or(self.default_caption.as_str());
        info!(
            item_id = %file.item_id,
            path = %path.display(),
            publisher = self.publisher.name(),
            "Publishing"
        );

        let receipt = self.publisher.publish(path, caption).await?;
        info!(item_id = %file.item_id, media_id = %receipt.media_id, "Reposted");
        Ok(receipt)
    }
}
