//! Watch-time analytics fed by the playback heartbeat.
//!
//! State is one document: total minutes, minutes per local calendar day,
//! and watched seconds per video.

use crate::storage::{KvStore, StoreError};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const ANALYTICS_KEY: &str = "yt_app_analytics_v1";
pub const LAST_WATCHED_KEY: &str = "last_watched";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsState {
    pub total_minutes: u64,
    /// "YYYY-MM-DD" -> minutes
    pub daily_logs: BTreeMap<String, u64>,
    /// video id -> seconds watched
    pub video_progress: HashMap<String, u64>,
}

impl AnalyticsState {
    pub fn minutes_on(&self, day: NaiveDate) -> u64 {
        self.daily_logs
            .get(&day.format(DATE_FORMAT).to_string())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayMinutes {
    pub date: NaiveDate,
    /// Short weekday name ("Mon")
    pub label: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total_minutes: u64,
    pub today_minutes: u64,
    /// Oldest first, ending today
    pub last_7_days: Vec<DayMinutes>,
}

impl AnalyticsSummary {
    /// "3h 25m"
    pub fn total_formatted(&self) -> String {
        format!("{}h {}m", self.total_minutes / 60, self.total_minutes % 60)
    }
}

/// Where playback stopped last time, for resuming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastWatched {
    pub video_id: String,
    pub title: String,
    pub position_secs: u64,
    pub at: DateTime<Utc>,
}

pub struct Tracker {
    store: Arc<KvStore>,
}

impl Tracker {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// One heartbeat tick: a watched minute for today and the total, plus
    /// `tick_secs` of progress for the video.
    pub fn record_heartbeat(
        &self,
        video_id: &str,
        tick_secs: u64,
    ) -> Result<AnalyticsState, StoreError> {
        self.record_heartbeat_on(video_id, tick_secs, Local::now().date_naive())
    }

    pub fn record_heartbeat_on(
        &self,
        video_id: &str,
        tick_secs: u64,
        day: NaiveDate,
    ) -> Result<AnalyticsState, StoreError> {
        self.store
            .update(ANALYTICS_KEY, |state: &mut AnalyticsState| {
                state.total_minutes += 1;
                *state
                    .daily_logs
                    .entry(day.format(DATE_FORMAT).to_string())
                    .or_insert(0) += 1;
                if !video_id.is_empty() {
                    *state.video_progress.entry(video_id.to_string()).or_insert(0) += tick_secs;
                }
                state.clone()
            })
    }

    pub fn state(&self) -> AnalyticsState {
        self.store.get_or_default(ANALYTICS_KEY)
    }

    pub fn watched_seconds(&self, video_id: &str) -> u64 {
        self.state()
            .video_progress
            .get(video_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn summary(&self) -> AnalyticsSummary {
        self.summary_on(Local::now().date_naive())
    }

    pub fn summary_on(&self, today: NaiveDate) -> AnalyticsSummary {
        let state = self.state();
        let last_7_days = (0..7)
            .rev()
            .map(|days_back| {
                let date = today - Duration::days(days_back);
                DayMinutes {
                    date,
                    label: date.format("%a").to_string(),
                    minutes: state.minutes_on(date),
                }
            })
            .collect();

        AnalyticsSummary {
            total_minutes: state.total_minutes,
            today_minutes: state.minutes_on(today),
            last_7_days,
        }
    }

    pub fn set_last_watched(&self, last: &LastWatched) -> Result<(), StoreError> {
        self.store.set(LAST_WATCHED_KEY, last)
    }

    pub fn last_watched(&self) -> Option<LastWatched> {
        self.store.get_or_default(LAST_WATCHED_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Tracker) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(KvStore::open(temp_dir.path()).unwrap());
        (temp_dir, Tracker::new(store))
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_heartbeat_counts_one_minute() {
        let (_temp_dir, tracker) = setup();
        let today = day(2024, 6, 3);

        let state = tracker.record_heartbeat_on("vid", 60, today).unwrap();
        assert_eq!(state.total_minutes, 1);
        assert_eq!(state.minutes_on(today), 1);
        assert_eq!(state.video_progress["vid"], 60);

        let state = tracker.record_heartbeat_on("vid", 60, today).unwrap();
        assert_eq!(state.total_minutes, 2);
        assert_eq!(state.minutes_on(today), 2);
        assert_eq!(tracker.watched_seconds("vid"), 120);
    }

    #[test]
    fn test_days_are_separate() {
        let (_temp_dir, tracker) = setup();
        tracker.record_heartbeat_on("a", 60, day(2024, 6, 1)).unwrap();
        tracker.record_heartbeat_on("b", 60, day(2024, 6, 2)).unwrap();
        tracker.record_heartbeat_on("b", 60, day(2024, 6, 2)).unwrap();

        let state = tracker.state();
        assert_eq!(state.total_minutes, 3);
        assert_eq!(state.minutes_on(day(2024, 6, 1)), 1);
        assert_eq!(state.minutes_on(day(2024, 6, 2)), 2);
        assert_eq!(state.daily_logs["2024-06-02"], 2);
    }

    #[test]
    fn test_summary_last_seven_days() {
        let (_temp_dir, tracker) = setup();
        let today = day(2024, 6, 9); // a Sunday
        tracker.record_heartbeat_on("a", 60, today).unwrap();
        tracker.record_heartbeat_on("a", 60, day(2024, 6, 3)).unwrap();
        tracker.record_heartbeat_on("a", 60, day(2024, 6, 1)).unwrap(); // outside the window

        let summary = tracker.summary_on(today);
        assert_eq!(summary.total_minutes, 3);
        assert_eq!(summary.today_minutes, 1);
        assert_eq!(summary.last_7_days.len(), 7);
        assert_eq!(summary.last_7_days[0].date, day(2024, 6, 3));
        assert_eq!(summary.last_7_days[0].label, "Mon");
        assert_eq!(summary.last_7_days[0].minutes, 1);
        assert_eq!(summary.last_7_days[6].label, "Sun");
        assert_eq!(summary.last_7_days.iter().map(|d| d.minutes).sum::<u64>(), 2);
    }

    #[test]
    fn test_total_formatted() {
        let summary = AnalyticsSummary {
            total_minutes: 205,
            today_minutes: 0,
            last_7_days: Vec::new(),
        };
        assert_eq!(summary.total_formatted(), "3h 25m");
    }

    #[test]
    fn test_state_uses_camel_case_keys() {
        let (_temp_dir, tracker) = setup();
        tracker.record_heartbeat_on("vid", 60, day(2024, 1, 1)).unwrap();
        let value = serde_json::to_value(tracker.state()).unwrap();
        assert_eq!(value["totalMinutes"], 1);
        assert_eq!(value["dailyLogs"]["2024-01-01"], 1);
        assert_eq!(value["videoProgress"]["vid"], 60);
    }

    #[test]
    fn test_last_watched_pointer() {
        let (_temp_dir, tracker) = setup();
        assert!(tracker.last_watched().is_none());
        let last = LastWatched {
            video_id: "vid".into(),
            title: "Optics".into(),
            position_secs: 312,
            at: Utc::now(),
        };
        tracker.set_last_watched(&last).unwrap();
        assert_eq!(tracker.last_watched(), Some(last));
    }
}
