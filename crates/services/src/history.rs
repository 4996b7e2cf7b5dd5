//! Watch history: most recent first, capped, one entry per video.

use crate::storage::{KvStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::FeedItem;
use std::sync::Arc;

pub const HISTORY_KEY: &str = "watch_history";

/// Maximum entries kept
pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    #[serde(flatten)]
    pub video: FeedItem,
    pub watched_at: DateTime<Utc>,
}

pub struct WatchHistory {
    store: Arc<KvStore>,
}

impl WatchHistory {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    pub fn add(&self, video: &FeedItem) -> Result<(), StoreError> {
        self.add_at(video, Utc::now())
    }

    /// Record a view. A re-watched video moves to the front instead of duplicating.
    pub fn add_at(&self, video: &FeedItem, watched_at: DateTime<Utc>) -> Result<(), StoreError> {
        if video.id.is_empty() {
            return Ok(());
        }

        self.store
            .update(HISTORY_KEY, |history: &mut Vec<WatchHistoryEntry>| {
                history.retain(|entry| entry.video.id != video.id);
                history.insert(
                    0,
                    WatchHistoryEntry {
                        video: video.clone(),
                        watched_at,
                    },
                );
                history.truncate(MAX_HISTORY);
            })
    }

    pub fn list(&self) -> Vec<WatchHistoryEntry> {
        self.store.get_or_default(HISTORY_KEY)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::ContentKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, WatchHistory) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(KvStore::open(temp_dir.path()).unwrap());
        (temp_dir, WatchHistory::new(store))
    }

    fn video(id: &str) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            title: format!("Lecture {}", id),
            thumbnail: None,
            channel_id: "UC1".into(),
            channel_title: "Physics".into(),
            published_at: None,
            description: String::new(),
            kind: ContentKind::Video,
        }
    }

    #[test]
    fn test_most_recent_first() {
        let (_temp_dir, history) = setup();
        history.add(&video("a")).unwrap();
        history.add(&video("b")).unwrap();

        let ids: Vec<String> = history.list().into_iter().map(|e| e.video.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_rewatch_moves_to_front() {
        let (_temp_dir, history) = setup();
        history.add(&video("a")).unwrap();
        history.add(&video("b")).unwrap();
        history.add(&video("c")).unwrap();
        history.add(&video("a")).unwrap();

        let ids: Vec<String> = history.list().into_iter().map(|e| e.video.id).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_capped_at_one_hundred() {
        let (_temp_dir, history) = setup();
        for i in 0..MAX_HISTORY + 5 {
            history.add(&video(&format!("v{}", i))).unwrap();
        }

        let entries = history.list();
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0].video.id, format!("v{}", MAX_HISTORY + 4));
        // The five oldest fell off the end
        assert!(entries.iter().all(|e| e.video.id != "v4"));
        assert_eq!(entries[MAX_HISTORY - 1].video.id, "v5");
    }

    #[test]
    fn test_empty_id_ignored() {
        let (_temp_dir, history) = setup();
        history.add(&video("")).unwrap();
        assert!(history.list().is_empty());
    }

    #[test]
    fn test_clear() {
        let (_temp_dir, history) = setup();
        history.add(&video("a")).unwrap();
        history.clear().unwrap();
        assert!(history.list().is_empty());
    }

    #[test]
    fn test_entry_is_flat_json() {
        let entry = WatchHistoryEntry {
            video: video("a"),
            watched_at: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "a");
        assert!(value.get("watched_at").is_some());
    }
}
