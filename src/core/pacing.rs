//! Fixed pacing delays between platform calls.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Delays inserted around each publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Wait between a finished download and the publish call
    pub after_download: Duration,

    /// Wait after a publish attempt, before the next candidate
    pub after_publish: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            after_download: Duration::from_secs(5),
            after_publish: Duration::from_secs(30),
        }
    }
}

impl PacingPolicy {
    /// No waiting at all
    pub fn none() -> Self {
        Self {
            after_download: Duration::ZERO,
            after_publish: Duration::ZERO,
        }
    }
}

/// Which pause is being taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    AfterDownload,
    AfterPublish,
}

/// Performs pacing pauses
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, kind: PauseKind, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        debug!(?kind, secs = duration.as_secs_f64(), "Pacing");
        tokio::time::sleep(duration).await;
    }
}
