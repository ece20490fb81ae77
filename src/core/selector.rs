//! Candidate selection: filter a profile feed down to recent, popular videos
//! and rank them by engagement.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::adapters::{ContentFeed, FeedError};
use crate::domain::{Candidate, ContentItem};

fn default_lookback() -> Duration {
    Duration::days(7)
}
fn default_min_engagement() -> u64 {
    1000
}
fn default_max_scan() -> usize {
    1000
}

/// Selection criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Only items created strictly after `now - lookback` qualify
    pub lookback: Duration,

    /// Only items with engagement strictly above this qualify
    pub min_engagement: u64,

    /// Upper bound on feed items examined per selection
    pub max_scan: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            min_engagement: default_min_engagement(),
            max_scan: default_max_scan(),
        }
    }
}

impl SelectionPolicy {
    /// Whether a single item passes the type, recency and engagement filters
    pub fn accepts(&self, item: &ContentItem, now: DateTime<Utc>) -> bool {
        let threshold = now - self.lookback;
        item.is_video() && item.created_at > threshold && item.engagement > self.min_engagement
    }
}

/// Scan the feed and return qualifying items, most engaging first.
///
/// The feed is read page by page until it runs out or `max_scan` items have
/// been examined. Its ordering is not relied on, so there is no early exit
/// on old items. Items with equal engagement keep their feed order.
pub async fn select_candidates(
    feed: &dyn ContentFeed,
    policy: &SelectionPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<Candidate>, FeedError> {
    let mut candidates = Vec::new();
    let mut cursor: Option<String> = None;
    let mut scanned = 0usize;

    'pages: loop {
        if scanned >= policy.max_scan {
            warn!(max_scan = policy.max_scan, "Feed scan cap reached, stopping early");
            break;
        }

        let page = feed.next_page(cursor.as_deref()).await?;
        debug!(feed = feed.name(), items = page.items.len(), "Fetched feed page");

        if page.items.is_empty() {
            break;
        }

        for item in page.items {
            if scanned >= policy.max_scan {
                warn!(max_scan = policy.max_scan, "Feed scan cap reached, stopping early");
                break 'pages;
            }
            scanned += 1;

            if policy.accepts(&item, now) {
                candidates.push(Candidate::new(item));
            }
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    // Stable: ties keep feed order
    candidates.sort_by(|a: &Candidate, b: &Candidate| b.rank.cmp(&a.rank));

    info!(scanned, selected = candidates.len(), "Selected candidates");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaKind;

    fn at(now: DateTime<Utc>, age: Duration, engagement: u64, kind: MediaKind) -> ContentItem {
        ContentItem::new("x", now - age, engagement, kind, "u")
    }

    #[test]
    fn test_default_policy() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.lookback, Duration::days(7));
        assert_eq!(policy.min_engagement, 1000);
        assert_eq!(policy.max_scan, 1000);
    }

    #[test]
    fn test_accepts_boundaries() {
        let now = Utc::now();
        let policy = SelectionPolicy::default();

        assert!(policy.accepts(&at(now, Duration::days(1), 1001, MediaKind::Video), now));

        // Engagement must be strictly greater
        assert!(!policy.accepts(&at(now, Duration::days(1), 1000, MediaKind::Video), now));

        // Exactly at the window edge is too old
        assert!(!policy.accepts(&at(now, Duration::days(7), 5000, MediaKind::Video), now));
        assert!(policy.accepts(
            &at(now, Duration::days(7) - Duration::seconds(1), 5000, MediaKind::Video),
            now
        ));

        // Images never qualify
        assert!(!policy.accepts(&at(now, Duration::hours(1), 9000, MediaKind::Other), now));
    }
}
