//! reelbot - repost trending reels from a profile
//!
//! Finds the profile's most-liked recent videos, downloads them into a
//! scratch directory and publishes them again with a caption, pausing
//! between platform calls.
//!
//! # Modules
//!
//! - `adapters`: Platform integrations (Instagram Graph API) and the
//!   downloader/publisher wrappers around them
//! - `core`: Orchestration logic (Selector, Staging, Pacing, Orchestrator)
//! - `domain`: Data structures (ContentItem, Candidate, RunReport)
//! - `config`: Credentials and settings
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! export INSTAGRAM_USERNAME=myaccount
//! export INSTAGRAM_ACCESS_TOKEN=...
//! reelbot
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{Orchestrator, RunError, SelectionPolicy, StagingDir};
pub use crate::domain::{Candidate, ContentItem, MediaKind, RunReport, RunState};
