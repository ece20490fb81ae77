//! Main orchestrator for repost runs.
//!
//! Drives candidate selection, then downloads, paces and publishes each
//! candidate in rank order, and always finishes with a staging cleanup.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{ContentFeed, Downloader, MediaFetcher, MediaPublisher, Publisher};
use crate::domain::{Candidate, ItemOutcome, ItemStatus, RunPhase, RunReport, RunState};

use super::pacing::{Pacer, PacingPolicy, PauseKind, TokioPacer};
use super::selector::{select_candidates, SelectionPolicy};
use super::staging::{StagingDir, StagingError};

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Staging failure: {0}")]
    Staging(#[from] StagingError),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

/// Sequential select → download → publish loop
pub struct Orchestrator {
    feed: Arc<dyn ContentFeed>,
    downloader: Downloader,
    publisher: Publisher,
    staging: StagingDir,
    pacer: Arc<dyn Pacer>,
    selection: SelectionPolicy,
    pacing: PacingPolicy,
}

impl Orchestrator {
    /// Create an orchestrator with default selection, pacing and caption
    pub fn new(
        feed: Arc<dyn ContentFeed>,
        fetcher: Arc<dyn MediaFetcher>,
        publisher: Arc<dyn MediaPublisher>,
        staging: StagingDir,
    ) -> Self {
        Self {
            feed,
            downloader: Downloader::new(fetcher),
            publisher: Publisher::new(publisher),
            staging,
            pacer: Arc::new(TokioPacer),
            selection: SelectionPolicy::default(),
            pacing: PacingPolicy::default(),
        }
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Caption used for every publish in this run
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.publisher = self.publisher.with_default_caption(caption);
        self
    }

    /// Repost up to `target_count` of the top candidates.
    ///
    /// Per-item failures are recorded in the report and never abort the run.
    /// Cleanup runs exactly once before returning. An unexpected failure is
    /// reported as `RunState::Failed`; only staging failures come back as
    /// `Err`.
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, target_count: usize) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        info!(target_count, "Starting repost run");

        let mut report = RunReport::new(run_id);
        enter(RunPhase::Init);

        let outcome = self.process(target_count, &mut report).await;

        enter(RunPhase::Cleanup);
        let cleanup = self.staging.cleanup().await;

        match (outcome, cleanup) {
            (_, Err(e)) => {
                error!(error = %e, "Cleanup failed");
                report.finish(RunState::Failed {
                    reason: e.to_string(),
                });
                enter(RunPhase::Failed);
                Err(RunError::Staging(e))
            }
            (Err(RunError::Staging(e)), Ok(())) => {
                error!(error = %e, "Run aborted on staging failure");
                enter(RunPhase::Failed);
                Err(RunError::Staging(e))
            }
            (Err(e), Ok(())) => {
                error!(error = %e, "Run failed");
                report.finish(RunState::Failed {
                    reason: e.to_string(),
                });
                enter(RunPhase::Failed);
                Ok(report)
            }
            (Ok(()), Ok(())) => {
                report.finish(RunState::Done);
                enter(RunPhase::Done);
                info!(
                    selected = report.candidates_selected,
                    attempted = report.outcomes.len(),
                    reposted = report.reposted(),
                    "Run completed"
                );
                Ok(report)
            }
        }
    }

    async fn process(&self, target_count: usize, report: &mut RunReport) -> Result<(), RunError> {
        self.staging.init().await?;

        enter(RunPhase::Selecting);
        let candidates = select_candidates(self.feed.as_ref(), &self.selection, Utc::now())
            .await
            .map_err(|e| RunError::Unexpected(format!("candidate selection failed: {}", e)))?;
        report.candidates_selected = candidates.len();

        for candidate in candidates.iter().take(target_count) {
            let outcome = self.process_candidate(candidate).await;
            report.record(outcome);
        }

        Ok(())
    }

    /// Download, pace, publish and pace a single candidate
    async fn process_candidate(&self, candidate: &Candidate) -> ItemOutcome {
        let item = &candidate.item;
        let outcome = |status| ItemOutcome {
            item_id: item.id.clone(),
            engagement: candidate.rank,
            status,
        };

        enter(RunPhase::Downloading);
        let staged = match self.downloader.fetch_to_staging(item, &self.staging).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!(item_id = %item.id, stage = "download", error = %e, "Skipping candidate");
                return outcome(ItemStatus::DownloadFailed {
                    error: e.to_string(),
                });
            }
        };

        enter(RunPhase::Pacing);
        self.pacer
            .pause(PauseKind::AfterDownload, self.pacing.after_download)
            .await;

        enter(RunPhase::Publishing);
        let status = match self.publisher.publish(&staged, None).await {
            Ok(receipt) => ItemStatus::Reposted {
                media_id: receipt.media_id,
            },
            Err(e) => {
                warn!(item_id = %item.id, stage = "publish", error = %e, "Publish failed");
                ItemStatus::PublishFailed {
                    error: e.to_string(),
                }
            }
        };

        enter(RunPhase::Pacing);
        self.pacer
            .pause(PauseKind::AfterPublish, self.pacing.after_publish)
            .await;

        outcome(status)
    }
}

fn enter(phase: RunPhase) {
    debug!(%phase, "Run phase");
}
