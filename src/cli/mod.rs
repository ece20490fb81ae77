//! Command-line interface for reelbot.
//!
//! A single fixed invocation: log in, repost the top candidates, clean up.
//! Flags only override what the config file and environment already provide.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::adapters::InstagramClient;
use crate::config::{Credentials, Settings};
use crate::core::{Orchestrator, StagingDir};
use crate::domain::{ItemStatus, RunReport, RunState};

/// Number of reels reposted per run
pub const DEFAULT_TARGET_COUNT: usize = 3;

/// reelbot - repost your most-liked recent reels
#[derive(Parser, Debug)]
#[command(name = "reelbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the nearest .reelbot/config.yaml)
    #[arg(long, env = "REELBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of candidates to repost
    #[arg(long, default_value_t = DEFAULT_TARGET_COUNT)]
    pub count: usize,
}

impl Cli {
    /// Execute the run
    pub async fn execute(self) -> Result<()> {
        let settings =
            Settings::load(self.config.as_deref()).context("Failed to load configuration")?;
        let credentials = Credentials::from_env().context("Credentials are not configured")?;

        let staging = StagingDir::new(&settings.staging_dir);
        staging
            .init()
            .await
            .context("Failed to prepare staging directory")?;

        let client = Arc::new(
            InstagramClient::login(
                &credentials.username,
                credentials.access_token(),
                settings.instagram.clone(),
            )
            .await
            .with_context(|| format!("Login failed for '{}'", credentials.username))?,
        );
        eprintln!("[Reposting as @{}]", client.username());

        let orchestrator = Orchestrator::new(client.clone(), client.clone(), client, staging)
            .with_selection(settings.selection.clone())
            .with_pacing(settings.pacing)
            .with_caption(settings.caption.clone());

        let report = orchestrator.run(self.count).await.context("Run aborted")?;
        print_report(&report);

        match &report.state {
            RunState::Done => {
                eprintln!("\n[Run {} completed: {} reposted]", report.id, report.reposted());
                Ok(())
            }
            RunState::Failed { reason } => {
                eprintln!("\n[Run {} failed: {}]", report.id, reason);
                std::process::exit(1);
            }
            RunState::Running => {
                eprintln!("\n[Run {} in state: {:?}]", report.id, report.state);
                Ok(())
            }
        }
    }
}

/// Print one line per attempted candidate
fn print_report(report: &RunReport) {
    println!(
        "Selected {} candidate(s), attempted {}",
        report.candidates_selected,
        report.outcomes.len()
    );

    if report.outcomes.is_empty() {
        return;
    }

    println!("{:<22} {:>10} {:<16} {}", "ITEM", "LIKES", "RESULT", "DETAIL");
    println!("{}", "-".repeat(75));

    for outcome in &report.outcomes {
        let (result, detail) = match &outcome.status {
            ItemStatus::Reposted { media_id } => ("reposted", media_id.as_str()),
            ItemStatus::DownloadFailed { error } => ("download-failed", error.as_str()),
            ItemStatus::PublishFailed { error } => ("publish-failed", error.as_str()),
        };
        println!(
            "{:<22} {:>10} {:<16} {}",
            outcome.item_id, outcome.engagement, result, detail
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_uses_defaults() {
        let cli = Cli::try_parse_from(["reelbot"]).unwrap();
        assert_eq!(cli.count, DEFAULT_TARGET_COUNT);
    }

    #[test]
    fn test_count_override() {
        let cli = Cli::try_parse_from(["reelbot", "--count", "5"]).unwrap();
        assert_eq!(cli.count, 5);
    }
}
