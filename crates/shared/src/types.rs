//! Projections of YouTube API resources and playback state.
//!
//! These are the shapes the rest of the workspace works with; the raw API
//! response structs live next to the HTTP calls in `providers::youtube`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curated channel shown in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// What a feed item represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    /// A finished live stream kept as a recording
    LiveArchive,
    /// A stream broadcasting right now
    LiveNow,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::LiveArchive => "live archive",
            ContentKind::LiveNow => "LIVE",
        }
    }
}

/// Video or live event as listed in a feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub item_count: u64,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: Option<String>,
    pub view_count: Option<u64>,
    /// Present only while the video is broadcasting
    pub live_chat_id: Option<String>,
}

impl VideoDetails {
    /// Projection used by history and the last-watched pointer
    pub fn to_feed_item(&self) -> FeedItem {
        FeedItem {
            id: self.id.clone(),
            title: self.title.clone(),
            thumbnail: self.thumbnail.clone(),
            channel_id: self.channel_id.clone(),
            channel_title: self.channel_title.clone(),
            published_at: self.published_at,
            description: self.description.clone(),
            kind: if self.live_chat_id.is_some() {
                ContentKind::LiveNow
            } else {
                ContentKind::Video
            },
        }
    }
}

/// Top-level comment on a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    /// Plain text; the API's HTML is rendered down before it lands here
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub author_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveChatMessage {
    pub id: String,
    pub author: String,
    pub message: String,
    pub author_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// One response of the live chat endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPage {
    pub messages: Vec<LiveChatMessage>,
    pub next_page_token: Option<String>,
    /// Server-suggested wait before the next poll
    pub polling_interval_ms: Option<u64>,
}

/// A page of results plus the token for the following page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

/// Google account profile returned by the userinfo endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Player status as reported by the embedded IFrame player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Ended,
}

impl PlayerState {
    /// Map an IFrame API state code. "Cued" (5) counts as not started.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 | 5 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::Playing)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Embed URL with related videos limited to the same channel and minimal branding
pub fn embed_url(video_id: &str, start_secs: u64) -> String {
    let mut url = format!(
        "https://www.youtube.com/embed/{}?autoplay=1&rel=0&modestbranding=1",
        video_id
    );
    if start_secs > 0 {
        url.push_str(&format!("&start={}", start_secs));
    }
    url
}
