//! Channel feed aggregation.
//!
//! Fans out over the selected channels, then merges everything into one
//! list: newest first, one entry per video id. Failed calls contribute
//! nothing; the first failure is kept as a banner for the UI.

use futures::future::join_all;
use shared::error::ApiError;
use shared::source::VideoSource;
use shared::types::{Channel, FeedItem, Page};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedTab {
    /// Live, archived streams and uploads together
    #[default]
    Home,
    Videos,
    Live,
}

impl FeedTab {
    fn wants_live(self) -> bool {
        matches!(self, FeedTab::Home | FeedTab::Live)
    }

    fn wants_uploads(self) -> bool {
        matches!(self, FeedTab::Home | FeedTab::Videos)
    }
}

impl FromStr for FeedTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" | "all" => Ok(FeedTab::Home),
            "videos" => Ok(FeedTab::Videos),
            "live" => Ok(FeedTab::Live),
            other => Err(format!("unknown tab '{}' (home, videos, live)", other)),
        }
    }
}

impl fmt::Display for FeedTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedTab::Home => "home",
            FeedTab::Videos => "videos",
            FeedTab::Live => "live",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    #[default]
    All,
    Only(Channel),
}

impl ChannelFilter {
    pub fn select<'a>(&'a self, curated: &'a [Channel]) -> Vec<&'a Channel> {
        match self {
            ChannelFilter::All => curated.iter().collect(),
            ChannelFilter::Only(channel) => vec![channel],
        }
    }
}

/// Page tokens for the two paged sources of a single-channel feed.
///
/// Encoded as `<uploads>.<archives>`; API page tokens never contain a dot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedCursor {
    pub uploads: Option<String>,
    pub archives: Option<String>,
}

impl FeedCursor {
    pub fn is_exhausted(&self) -> bool {
        self.uploads.is_none() && self.archives.is_none()
    }

    pub fn encode(&self) -> String {
        format!(
            "{}.{}",
            self.uploads.as_deref().unwrap_or_default(),
            self.archives.as_deref().unwrap_or_default()
        )
    }

    pub fn decode(token: &str) -> Option<Self> {
        let (uploads, archives) = token.split_once('.')?;
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let cursor = Self {
            uploads: non_empty(uploads),
            archives: non_empty(archives),
        };
        (!cursor.is_exhausted()).then_some(cursor)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feed {
    pub items: Vec<FeedItem>,
    /// First upstream failure, as "<status>: <message>"
    pub banner: Option<String>,
    /// Set only for single-channel feeds with more to load
    pub next: Option<FeedCursor>,
}

/// Flatten, newest first (undated items last), then drop repeated ids.
pub fn merge_items(batches: Vec<Vec<FeedItem>>) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = batches.into_iter().flatten().collect();
    // Option orders None first; reversed, undated items sink to the end
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    dedupe_by_id(items)
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedupe_by_id(items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

struct ChannelFetch {
    live: Option<Result<Vec<FeedItem>, ApiError>>,
    archives: Option<Result<Page<FeedItem>, ApiError>>,
    uploads: Option<Result<Page<FeedItem>, ApiError>>,
}

pub struct FeedAggregator<'a> {
    source: &'a dyn VideoSource,
    page_size: u32,
}

impl<'a> FeedAggregator<'a> {
    pub fn new(source: &'a dyn VideoSource, page_size: u32) -> Self {
        Self { source, page_size }
    }

    /// Load one page of the feed.
    ///
    /// `cursor` continues a previous single-channel page; it is ignored when
    /// more than one channel is selected.
    pub async fn load(
        &self,
        channels: &[&Channel],
        tab: FeedTab,
        cursor: Option<&FeedCursor>,
    ) -> Feed {
        let single = channels.len() == 1;
        let cursor = match cursor {
            Some(_) if !single => {
                warn!("pagination is only available for a single channel; loading first page");
                None
            }
            other => other,
        };

        let fetches = join_all(
            channels
                .iter()
                .map(|channel| self.fetch_channel(channel, tab, cursor)),
        )
        .await;

        let mut banner: Option<String> = None;
        let mut next = FeedCursor::default();
        let mut batches = Vec::new();

        for fetch in fetches {
            if let Some(result) = fetch.live {
                batches.push(take_or_note(result, &mut banner));
            }
            if let Some(result) = fetch.archives {
                let page = take_or_note(result, &mut banner);
                next.archives = page.next_page_token;
                batches.push(page.items);
            }
            if let Some(result) = fetch.uploads {
                let page = take_or_note(result, &mut banner);
                next.uploads = page.next_page_token;
                batches.push(page.items);
            }
        }

        let items = merge_items(batches);
        debug!("feed {} over {} channel(s): {} items", tab, channels.len(), items.len());

        Feed {
            items,
            banner,
            next: (single && !next.is_exhausted()).then_some(next),
        }
    }

    async fn fetch_channel(
        &self,
        channel: &Channel,
        tab: FeedTab,
        cursor: Option<&FeedCursor>,
    ) -> ChannelFetch {
        // On later pages only sources that still have a token are fetched
        let archives_token = cursor.map(|c| c.archives.as_deref());
        let uploads_token = cursor.map(|c| c.uploads.as_deref());
        let first_page = cursor.is_none();

        let live = async {
            if tab.wants_live() && first_page {
                Some(self.source.active_live(&channel.id).await)
            } else {
                None
            }
        };
        let archives = async {
            match archives_token {
                _ if !tab.wants_live() => None,
                None => Some(self.source.live_archives(&channel.id, None).await),
                Some(Some(token)) => Some(self.source.live_archives(&channel.id, Some(token)).await),
                Some(None) => None,
            }
        };
        let uploads = async {
            match uploads_token {
                _ if !tab.wants_uploads() => None,
                None => Some(
                    self.source
                        .channel_uploads(&channel.id, None, self.page_size)
                        .await,
                ),
                Some(Some(token)) => Some(
                    self.source
                        .channel_uploads(&channel.id, Some(token), self.page_size)
                        .await,
                ),
                Some(None) => None,
            }
        };

        let (live, archives, uploads) = futures::join!(live, archives, uploads);
        ChannelFetch {
            live,
            archives,
            uploads,
        }
    }
}

fn take_or_note<T: Default>(result: Result<T, ApiError>, banner: &mut Option<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("feed request failed: {}", e);
            if banner.is_none() {
                *banner = Some(e.to_string());
            }
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use shared::types::ContentKind;

    fn item(id: &str, day: Option<u32>, kind: ContentKind) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            thumbnail: None,
            channel_id: "UC1".into(),
            channel_title: "Channel".into(),
            published_at: day.map(|d| Utc.with_ymd_and_hms(2024, 5, d, 10, 0, 0).unwrap()),
            description: String::new(),
            kind,
        }
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[derive(Default)]
    struct FakeSource {
        fail_uploads_for: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn channel_uploads(
            &self,
            channel_id: &str,
            page_token: Option<&str>,
            max_results: u32,
        ) -> Result<Page<FeedItem>, ApiError> {
            self.calls.lock().push(format!(
                "uploads {} {:?} {}",
                channel_id, page_token, max_results
            ));
            if self.fail_uploads_for.as_deref() == Some(channel_id) {
                return Err(ApiError::Status {
                    status: 403,
                    message: "quotaExceeded".into(),
                });
            }
            let (items, next) = match page_token {
                None => (
                    vec![
                        item(&format!("{}-u1", channel_id), Some(3), ContentKind::Video),
                        item("shared", Some(2), ContentKind::Video),
                    ],
                    Some("U2".to_string()),
                ),
                Some(_) => (
                    vec![item(&format!("{}-u2", channel_id), Some(1), ContentKind::Video)],
                    None,
                ),
            };
            Ok(Page {
                items,
                next_page_token: next,
            })
        }

        async fn live_archives(
            &self,
            channel_id: &str,
            page_token: Option<&str>,
        ) -> Result<Page<FeedItem>, ApiError> {
            self.calls
                .lock()
                .push(format!("archives {} {:?}", channel_id, page_token));
            Ok(Page {
                items: vec![
                    item(&format!("{}-a1", channel_id), Some(4), ContentKind::LiveArchive),
                    item("shared", Some(2), ContentKind::LiveArchive),
                ],
                next_page_token: page_token.is_none().then(|| "A2".to_string()),
            })
        }

        async fn active_live(&self, channel_id: &str) -> Result<Vec<FeedItem>, ApiError> {
            self.calls.lock().push(format!("live {}", channel_id));
            Ok(vec![item(&format!("{}-live", channel_id), Some(5), ContentKind::LiveNow)])
        }
    }

    #[test]
    fn test_merge_sorts_newest_first_undated_last() {
        let merged = merge_items(vec![
            vec![item("old", Some(1), ContentKind::Video)],
            vec![
                item("undated", None, ContentKind::Video),
                item("new", Some(9), ContentKind::Video),
            ],
        ]);
        assert_eq!(ids(&merged), vec!["new", "old", "undated"]);
    }

    #[test]
    fn test_dedupe_keeps_first_and_is_idempotent() {
        let items = vec![
            item("a", Some(3), ContentKind::LiveArchive),
            item("b", Some(2), ContentKind::Video),
            item("a", Some(3), ContentKind::Video),
        ];
        let once = dedupe_by_id(items);
        assert_eq!(ids(&once), vec!["a", "b"]);
        assert_eq!(once[0].kind, ContentKind::LiveArchive);

        let twice = dedupe_by_id(once.clone());
        assert_eq!(twice, once);

        let merged = merge_items(vec![once.clone(), once.clone()]);
        assert_eq!(merge_items(vec![merged.clone()]), merged);
    }

    #[test]
    fn test_cursor_encoding() {
        let cursor = FeedCursor {
            uploads: Some("CAwQAA".into()),
            archives: None,
        };
        assert_eq!(cursor.encode(), "CAwQAA.");
        assert_eq!(FeedCursor::decode("CAwQAA."), Some(cursor));
        assert_eq!(FeedCursor::decode("."), None);
        assert_eq!(FeedCursor::decode("no-separator"), None);
    }

    #[test]
    fn test_tab_parsing() {
        assert_eq!("Videos".parse::<FeedTab>().unwrap(), FeedTab::Videos);
        assert_eq!("all".parse::<FeedTab>().unwrap(), FeedTab::Home);
        assert!("shorts".parse::<FeedTab>().is_err());
    }

    #[tokio::test]
    async fn test_home_tab_merges_all_sources() {
        let source = FakeSource::default();
        let a = Channel::new("A", "Alpha");
        let b = Channel::new("B", "Beta");
        let feed = FeedAggregator::new(&source, 12)
            .load(&[&a, &b], FeedTab::Home, None)
            .await;

        assert_eq!(feed.banner, None);
        assert_eq!(feed.next, None, "multi-channel feeds never paginate");
        let got = ids(&feed.items);
        assert_eq!(&got[..2], &["A-live", "B-live"]);
        assert_eq!(got.iter().filter(|id| **id == "shared").count(), 1);
        assert_eq!(got.len(), 7);
    }

    #[tokio::test]
    async fn test_videos_tab_skips_live_calls() {
        let source = FakeSource::default();
        let a = Channel::new("A", "Alpha");
        let feed = FeedAggregator::new(&source, 12)
            .load(&[&a], FeedTab::Videos, None)
            .await;

        assert_eq!(ids(&feed.items), vec!["A-u1", "shared"]);
        let calls = source.calls.lock().clone();
        assert_eq!(calls, vec!["uploads A None 12".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_becomes_banner() {
        let source = FakeSource {
            fail_uploads_for: Some("B".into()),
            ..Default::default()
        };
        let a = Channel::new("A", "Alpha");
        let b = Channel::new("B", "Beta");
        let feed = FeedAggregator::new(&source, 12)
            .load(&[&a, &b], FeedTab::Videos, None)
            .await;

        assert_eq!(feed.banner.as_deref(), Some("403: quotaExceeded"));
        assert_eq!(ids(&feed.items), vec!["A-u1", "shared"]);
    }

    #[tokio::test]
    async fn test_single_channel_pagination() {
        let source = FakeSource::default();
        let a = Channel::new("A", "Alpha");
        let aggregator = FeedAggregator::new(&source, 12);

        let first = aggregator.load(&[&a], FeedTab::Home, None).await;
        let cursor = first.next.clone().unwrap();
        assert_eq!(cursor.uploads.as_deref(), Some("U2"));
        assert_eq!(cursor.archives.as_deref(), Some("A2"));

        let second = aggregator.load(&[&a], FeedTab::Home, Some(&cursor)).await;
        // No active-live call on later pages
        assert!(!ids(&second.items).contains(&"A-live"));
        assert!(ids(&second.items).contains(&"A-u2"));
        // Archives end without a token; uploads too, so nothing further
        assert_eq!(second.next, None);
    }

    #[tokio::test]
    async fn test_cursor_ignored_for_many_channels() {
        let source = FakeSource::default();
        let a = Channel::new("A", "Alpha");
        let b = Channel::new("B", "Beta");
        let cursor = FeedCursor {
            uploads: Some("U2".into()),
            archives: None,
        };
        let feed = FeedAggregator::new(&source, 12)
            .load(&[&a, &b], FeedTab::Videos, Some(&cursor))
            .await;

        assert!(ids(&feed.items).contains(&"A-u1"));
        assert!(source
            .calls
            .lock()
            .iter()
            .all(|c| c.ends_with("None 12")));
    }
}
