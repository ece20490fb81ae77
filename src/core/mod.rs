//! Core orchestration logic.
//!
//! This module contains:
//! - Staging: scratch directory lifecycle
//! - Selector: candidate filtering and ranking
//! - Pacing: fixed delays between platform calls
//! - Orchestrator: the end-to-end repost loop

pub mod orchestrator;
pub mod pacing;
pub mod selector;
pub mod staging;

// Re-export commonly used types
pub use orchestrator::{Orchestrator, RunError};
pub use pacing::{Pacer, PacingPolicy, PauseKind, TokioPacer};
pub use selector::{select_candidates, SelectionPolicy};
pub use staging::{StagingDir, StagingError, DEFAULT_STAGING_DIR};
