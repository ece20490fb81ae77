//! Orchestrator Integration Tests
//!
//! End-to-end runs against fake collaborators: ordering, per-item failure
//! handling, pacing and staging cleanup.

mod common;

use std::sync::Arc;

use common::{video, BrokenFeed, PagedFeed, RecordingPacer, RecordingPublisher, StubFetcher};
use reelbot::adapters::{ContentFeed, DEFAULT_CAPTION};
use reelbot::core::{Orchestrator, PacingPolicy, PauseKind, RunError, StagingDir};
use reelbot::domain::{ItemStatus, RunState};
use tempfile::TempDir;

struct Harness {
    _temp: TempDir,
    staging: StagingDir,
    fetcher: Arc<StubFetcher>,
    publisher: Arc<RecordingPublisher>,
    pacer: Arc<RecordingPacer>,
}

impl Harness {
    fn new(fetcher: StubFetcher, publisher: RecordingPublisher) -> Self {
        let temp = TempDir::new().unwrap();
        let staging = StagingDir::new(temp.path().join("temp_downloads"));
        Self {
            _temp: temp,
            staging,
            fetcher: Arc::new(fetcher),
            publisher: Arc::new(publisher),
            pacer: Arc::new(RecordingPacer::default()),
        }
    }

    fn orchestrator(&self, feed: Arc<dyn ContentFeed>) -> Orchestrator {
        Orchestrator::new(
            feed,
            self.fetcher.clone(),
            self.publisher.clone(),
            self.staging.clone(),
        )
        .with_pacer(self.pacer.clone())
    }

    fn staged_entries(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }
}

fn trending_feed() -> Arc<PagedFeed> {
    Arc::new(PagedFeed::single(vec![
        video("a", 1, 500),
        video("b", 2, 1500),
        video("c", 3, 2000),
        video("d", 4, 1200),
        video("e", 5, 900),
    ]))
}

#[tokio::test]
async fn test_reposts_top_candidates_in_rank_order() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let orchestrator = harness.orchestrator(trending_feed());

    let report = orchestrator.run(3).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.candidates_selected, 3);
    assert_eq!(report.reposted(), 3);
    assert_eq!(harness.publisher.published_ids(), vec!["c", "b", "d"]);

    let engagements: Vec<u64> = report.outcomes.iter().map(|o| o.engagement).collect();
    assert_eq!(engagements, vec![2000, 1500, 1200]);
    assert_eq!(
        report.outcomes[0].status,
        ItemStatus::Reposted {
            media_id: "published-c".into()
        }
    );

    // Staged files are named after the creation timestamp, not the raw download
    for call in harness.publisher.calls() {
        assert!(call.file_name.ends_with(".mp4"));
        assert_eq!(call.file_name.len(), "YYYY-MM-DD_HH-MM-SS.mp4".len());
        assert_eq!(call.caption, DEFAULT_CAPTION);
    }

    assert!(harness.staging.path().is_dir());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn test_pacing_between_calls() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let orchestrator = harness.orchestrator(trending_feed());

    orchestrator.run(3).await.unwrap();

    assert_eq!(
        harness.pacer.kinds(),
        vec![
            PauseKind::AfterDownload,
            PauseKind::AfterPublish,
            PauseKind::AfterDownload,
            PauseKind::AfterPublish,
            PauseKind::AfterDownload,
            PauseKind::AfterPublish,
        ]
    );

    let pauses = harness.pacer.pauses.lock().unwrap();
    let defaults = PacingPolicy::default();
    assert_eq!(pauses[0].1, defaults.after_download);
    assert_eq!(pauses[1].1, defaults.after_publish);
}

#[tokio::test]
async fn test_single_repost_takes_both_pauses() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let feed = Arc::new(PagedFeed::single(vec![video("only", 2, 4000)]));
    let orchestrator = harness.orchestrator(feed);

    let report = orchestrator.run(1).await.unwrap();

    assert_eq!(report.reposted(), 1);
    assert_eq!(
        harness.pacer.kinds(),
        vec![PauseKind::AfterDownload, PauseKind::AfterPublish]
    );
}

#[tokio::test]
async fn test_download_failure_skips_publish_and_pacing() {
    let harness = Harness::new(StubFetcher::failing(&["b"]), RecordingPublisher::default());
    let orchestrator = harness.orchestrator(trending_feed());

    let report = orchestrator.run(3).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(harness.fetcher.calls(), vec!["c", "b", "d"]);
    assert_eq!(harness.publisher.published_ids(), vec!["c", "d"]);
    assert!(matches!(
        report.outcomes[1].status,
        ItemStatus::DownloadFailed { .. }
    ));
    assert_eq!(report.reposted(), 2);

    assert_eq!(
        harness.pacer.kinds(),
        vec![
            PauseKind::AfterDownload,
            PauseKind::AfterPublish,
            PauseKind::AfterDownload,
            PauseKind::AfterPublish,
        ]
    );
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn test_publish_failure_continues_with_next_candidate() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::failing_calls(&[1]));
    let orchestrator = harness.orchestrator(trending_feed());

    let report = orchestrator.run(2).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert!(matches!(
        report.outcomes[0].status,
        ItemStatus::PublishFailed { .. }
    ));
    assert!(matches!(
        report.outcomes[1].status,
        ItemStatus::Reposted { .. }
    ));
    assert_eq!(harness.publisher.published_ids(), vec!["c", "b"]);
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn test_zero_target_selects_but_processes_nothing() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let feed = trending_feed();
    let orchestrator = harness.orchestrator(feed.clone());

    let report = orchestrator.run(0).await.unwrap();

    assert_eq!(report.state, RunState::Done);
    assert_eq!(feed.requests(), 1);
    assert_eq!(report.candidates_selected, 3);
    assert!(report.outcomes.is_empty());
    assert!(harness.fetcher.calls().is_empty());
    assert!(harness.publisher.calls().is_empty());
    assert!(harness.pacer.kinds().is_empty());
    assert!(harness.staging.path().is_dir());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn test_target_larger_than_candidates() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let orchestrator = harness.orchestrator(trending_feed());

    let report = orchestrator.run(10).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.reposted(), 3);
}

#[tokio::test]
async fn test_feed_failure_still_cleans_up() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    harness.staging.init().await.unwrap();
    std::fs::write(harness.staging.path().join("leftover.mp4"), b"crash").unwrap();

    let orchestrator = harness.orchestrator(Arc::new(BrokenFeed));
    let report = orchestrator.run(3).await.unwrap();

    match &report.state {
        RunState::Failed { reason } => assert!(reason.contains("connection reset")),
        other => panic!("Expected failed run, got {:?}", other),
    }
    assert!(report.completed_at.is_some());
    assert!(harness.fetcher.calls().is_empty());
    assert!(harness.staging.path().is_dir());
    assert_eq!(harness.staged_entries(), 0);
}

#[tokio::test]
async fn test_custom_caption() {
    let harness = Harness::new(StubFetcher::default(), RecordingPublisher::default());
    let orchestrator = harness
        .orchestrator(trending_feed())
        .with_caption("Best of the week #repost");

    orchestrator.run(1).await.unwrap();

    let calls = harness.publisher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].caption, "Best of the week #repost");
}

#[tokio::test]
async fn test_unusable_staging_directory_is_fatal() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();

    let publisher = Arc::new(RecordingPublisher::default());
    let orchestrator = Orchestrator::new(
        trending_feed(),
        Arc::new(StubFetcher::default()),
        publisher.clone(),
        StagingDir::new(blocker.join("temp_downloads")),
    )
    .with_pacer(Arc::new(RecordingPacer::default()));

    let result = orchestrator.run(3).await;

    assert!(matches!(result, Err(RunError::Staging(_))));
    assert!(publisher.calls().is_empty());
}
