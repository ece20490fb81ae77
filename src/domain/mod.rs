//! Domain types for reelbot.
//!
//! - Content: feed items, ranked candidates, staged files
//! - Report: run state machine and per-candidate outcomes

pub mod content;
pub mod report;

// Re-export commonly used types
pub use content::{Candidate, ContentItem, MediaKind, StagedFile};
pub use report::{ItemOutcome, ItemStatus, RunPhase, RunReport, RunState};
