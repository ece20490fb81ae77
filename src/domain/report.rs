//! Run state and per-candidate outcomes.
//!
//! A RunReport is built in memory while the orchestrator works through the
//! candidate list. Nothing is persisted across runs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position in the orchestrator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Selecting,
    Downloading,
    Pacing,
    Publishing,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Init => "init",
            RunPhase::Selecting => "selecting",
            RunPhase::Downloading => "downloading",
            RunPhase::Pacing => "pacing",
            RunPhase::Publishing => "publishing",
            RunPhase::Cleanup => "cleanup",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunState {
    /// Still working through candidates
    Running,

    /// All selected candidates were attempted
    Done,

    /// The run stopped early on an unexpected error
    Failed { reason: String },
}

/// What happened to a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Downloaded and published
    Reposted { media_id: String },

    /// Download failed; the item was skipped
    DownloadFailed { error: String },

    /// Downloaded but the publish call failed
    PublishFailed { error: String },
}

/// Outcome record for one processed candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub engagement: u64,
    pub status: ItemStatus,
}

/// Summary of one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: Uuid,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of candidates the selector returned (before the target cap)
    pub candidates_selected: usize,

    /// One entry per candidate the orchestrator attempted, in order
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: RunState::Running,
            started_at: Utc::now(),
            completed_at: None,
            candidates_selected: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self, state: RunState) {
        self.state = state;
        self.completed_at = Some(Utc::now());
    }

    /// Number of candidates that were successfully reposted
    pub fn reposted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ItemStatus::Reposted { .. }))
            .count()
    }

    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }
}
