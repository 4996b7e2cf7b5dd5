//! YouTube Data API v3 gateway.
//!
//! Every method is one parameterized GET against `youtube/v3`, mapped from
//! the raw resource shapes into the projections in `shared::types`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::error::ApiError;
use shared::source::{ChatSource, VideoSource};
use shared::types::{
    ChatPage, Comment, ContentKind, FeedItem, LiveChatMessage, Page, Playlist, VideoDetails,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Results per page for archive/playlist listings
const LIST_PAGE_SIZE: u32 = 12;
const PLAYLIST_ITEMS_PAGE_SIZE: u32 = 50;
const ACTIVE_LIVE_MAX: u32 = 5;
const COMMENTS_MAX: u32 = 30;
const LIVE_CHAT_MAX: u32 = 10;

pub struct YouTubeClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    bearer: Option<String>,
    /// channel id -> uploads playlist id
    uploads_cache: RwLock<HashMap<String, String>>,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url: BASE_URL.to_string(),
            api_key,
            bearer: None,
            uploads_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Attach the signed-in user's OAuth token to every request.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.api_key.is_some() || self.bearer.is_some()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        if !self.is_authorized() {
            return Err(ApiError::Unauthenticated);
        }

        let url = format!("{}/{}", self.base_url, path);
        let mut query: Vec<(&str, &str)> = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }
        debug!("GET {} {:?}", path, params);

        let mut req = self.http.get(&url).query(&query);
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    /// Look up (and cache) the implicit uploads playlist of a channel.
    pub async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, ApiError> {
        if let Some(id) = self.uploads_cache.read().get(channel_id) {
            return Ok(id.clone());
        }

        let resp: ListResponse<ChannelResource> = self
            .get(
                "channels",
                &[
                    ("id", channel_id.to_string()),
                    ("part", "contentDetails".to_string()),
                ],
            )
            .await?;

        let uploads = resp
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details.related_playlists.uploads)
            .ok_or_else(|| ApiError::NotFound(format!("uploads playlist for {}", channel_id)))?;

        self.uploads_cache
            .write()
            .insert(channel_id.to_string(), uploads.clone());
        Ok(uploads)
    }

    async fn search_page(
        &self,
        mut params: Vec<(&str, String)>,
        kind: ContentKind,
    ) -> Result<Page<FeedItem>, ApiError> {
        params.push(("part", "snippet".to_string()));
        params.push(("type", "video".to_string()));
        let resp: ListResponse<SearchResource> = self.get("search", &params).await?;
        Ok(Page {
            items: resp
                .items
                .into_iter()
                .filter_map(|item| item.into_feed_item(kind))
                .collect(),
            next_page_token: resp.next_page_token,
        })
    }

    /// Keyword search, newest first, optionally limited to one channel and a start date.
    pub async fn search_videos(
        &self,
        query: &str,
        channel_id: Option<&str>,
        published_after: Option<DateTime<Utc>>,
        page_token: Option<&str>,
    ) -> Result<Page<FeedItem>, ApiError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("order", "date".to_string()),
            ("maxResults", LIST_PAGE_SIZE.to_string()),
            ("pageToken", page_token.unwrap_or_default().to_string()),
        ];
        if let Some(channel_id) = channel_id {
            params.push(("channelId", channel_id.to_string()));
        }
        if let Some(after) = published_after {
            params.push((
                "publishedAfter",
                after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ));
        }
        self.search_page(params, ContentKind::Video).await
    }

    pub async fn channel_playlists(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Playlist>, ApiError> {
        let resp: ListResponse<PlaylistResource> = self
            .get(
                "playlists",
                &[
                    ("channelId", channel_id.to_string()),
                    ("part", "snippet,contentDetails".to_string()),
                    ("maxResults", LIST_PAGE_SIZE.to_string()),
                    ("pageToken", page_token.unwrap_or_default().to_string()),
                ],
            )
            .await?;
        Ok(Page {
            items: resp.items.into_iter().map(Playlist::from).collect(),
            next_page_token: resp.next_page_token,
        })
    }

    pub async fn playlist_details(&self, playlist_id: &str) -> Result<Option<Playlist>, ApiError> {
        let resp: ListResponse<PlaylistResource> = self
            .get(
                "playlists",
                &[
                    ("id", playlist_id.to_string()),
                    ("part", "snippet,contentDetails".to_string()),
                ],
            )
            .await?;
        Ok(resp.items.into_iter().next().map(Playlist::from))
    }

    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Page<FeedItem>, ApiError> {
        let resp: ListResponse<PlaylistItemResource> = self
            .get(
                "playlistItems",
                &[
                    ("playlistId", playlist_id.to_string()),
                    ("part", "snippet,contentDetails".to_string()),
                    ("maxResults", max_results.to_string()),
                    ("pageToken", page_token.unwrap_or_default().to_string()),
                ],
            )
            .await?;
        Ok(Page {
            items: resp.items.into_iter().map(FeedItem::from).collect(),
            next_page_token: resp.next_page_token,
        })
    }

    /// A whole page of a playlist (50 entries)
    pub async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<FeedItem>, ApiError> {
        self.playlist_items(playlist_id, page_token, PLAYLIST_ITEMS_PAGE_SIZE)
            .await
    }

    pub async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ApiError> {
        let resp: ListResponse<VideoResource> = self
            .get(
                "videos",
                &[
                    ("id", video_id.to_string()),
                    ("part", "snippet,statistics,liveStreamingDetails".to_string()),
                ],
            )
            .await?;
        Ok(resp.items.into_iter().next().map(VideoDetails::from))
    }

    /// Most relevant top-level comments of a video
    pub async fn comments(&self, video_id: &str) -> Result<Vec<Comment>, ApiError> {
        let resp: ListResponse<CommentThreadResource> = self
            .get(
                "commentThreads",
                &[
                    ("videoId", video_id.to_string()),
                    ("part", "snippet".to_string()),
                    ("maxResults", COMMENTS_MAX.to_string()),
                    ("order", "relevance".to_string()),
                ],
            )
            .await?;
        Ok(resp.items.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn channel_uploads(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Page<FeedItem>, ApiError> {
        let playlist_id = self.uploads_playlist_id(channel_id).await?;
        self.playlist_items(&playlist_id, page_token, max_results)
            .await
    }

    async fn live_archives(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<FeedItem>, ApiError> {
        self.search_page(
            vec![
                ("channelId", channel_id.to_string()),
                ("eventType", "completed".to_string()),
                ("order", "date".to_string()),
                ("maxResults", LIST_PAGE_SIZE.to_string()),
                ("pageToken", page_token.unwrap_or_default().to_string()),
            ],
            ContentKind::LiveArchive,
        )
        .await
    }

    async fn active_live(&self, channel_id: &str) -> Result<Vec<FeedItem>, ApiError> {
        let page = self
            .search_page(
                vec![
                    ("channelId", channel_id.to_string()),
                    ("eventType", "live".to_string()),
                    ("maxResults", ACTIVE_LIVE_MAX.to_string()),
                ],
                ContentKind::LiveNow,
            )
            .await?;
        Ok(page.items)
    }
}

#[async_trait]
impl ChatSource for YouTubeClient {
    async fn live_chat_messages(
        &self,
        live_chat_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChatPage, ApiError> {
        let resp: LiveChatResponse = self
            .get(
                "liveChat/messages",
                &[
                    ("liveChatId", live_chat_id.to_string()),
                    ("part", "snippet,authorDetails".to_string()),
                    ("maxResults", LIVE_CHAT_MAX.to_string()),
                    ("pageToken", page_token.unwrap_or_default().to_string()),
                ],
            )
            .await?;
        Ok(resp.into())
    }
}

/// Turn a non-2xx body into an error, preferring Google's error envelope.
fn parse_error_body(status: u16, body: &str) -> ApiError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.is_empty() {
            return ApiError::Status {
                status,
                message: envelope.error.message,
            };
        }
    }
    let body = body.trim();
    let message = if body.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.chars().take(300).collect()
    };
    ApiError::Status { status, message }
}

/// Render the HTML in `textDisplay` as plain text.
fn html_to_text(html: &str) -> String {
    html2text::from_read_with_decorator(
        html.as_bytes(),
        4096,
        html2text::render::text_renderer::TrivialDecorator::new(),
    )
    .trim()
    .to_string()
}

// ============================================================================
// YouTube Data API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(&self) -> Option<String> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.fallback.as_ref())
            .map(|t| t.url.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_id: String,
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    thumbnails: Thumbnails,
}

impl Snippet {
    fn into_feed_item(self, id: String, kind: ContentKind) -> FeedItem {
        FeedItem {
            id,
            thumbnail: self.thumbnails.best(),
            title: self.title,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            published_at: self.published_at,
            description: self.description,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    #[serde(default)]
    content_details: ChannelContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    #[serde(default)]
    snippet: Snippet,
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
    video_published_at: Option<DateTime<Utc>>,
}

impl From<PlaylistItemResource> for FeedItem {
    fn from(item: PlaylistItemResource) -> Self {
        let published = item.content_details.video_published_at;
        let mut feed_item = item
            .snippet
            .into_feed_item(item.content_details.video_id, ContentKind::Video);
        // snippet.publishedAt is when the entry was added to the playlist
        if published.is_some() {
            feed_item.published_at = published;
        }
        feed_item
    }
}

#[derive(Debug, Deserialize)]
struct SearchResource {
    id: SearchId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

impl SearchResource {
    fn into_feed_item(self, kind: ContentKind) -> Option<FeedItem> {
        let id = self.id.video_id?;
        Some(self.snippet.into_feed_item(id, kind))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistResource {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    #[serde(default)]
    item_count: u64,
}

impl From<PlaylistResource> for Playlist {
    fn from(p: PlaylistResource) -> Self {
        Playlist {
            id: p.id,
            thumbnail: p.snippet.thumbnails.best(),
            title: p.snippet.title,
            item_count: p.content_details.map(|d| d.item_count).unwrap_or(0),
            channel_title: p.snippet.channel_title,
            published_at: p.snippet.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    statistics: Option<Statistics>,
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// The API sends counts as strings
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    active_live_chat_id: Option<String>,
}

impl From<VideoResource> for VideoDetails {
    fn from(v: VideoResource) -> Self {
        VideoDetails {
            id: v.id,
            thumbnail: v.snippet.thumbnails.best(),
            title: v.snippet.title,
            channel_id: v.snippet.channel_id,
            channel_title: v.snippet.channel_title,
            description: v.snippet.description,
            published_at: v.snippet.published_at,
            view_count: v
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|c| c.parse().ok()),
            live_chat_id: v.live_streaming_details.and_then(|d| d.active_live_chat_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentThreadResource {
    id: String,
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CommentSnippet {
    author_display_name: String,
    text_display: String,
    like_count: u64,
    published_at: Option<DateTime<Utc>>,
    author_profile_image_url: Option<String>,
}

impl From<CommentThreadResource> for Comment {
    fn from(thread: CommentThreadResource) -> Self {
        let s = thread.snippet.top_level_comment.snippet;
        Comment {
            id: thread.id,
            author: s.author_display_name,
            text: html_to_text(&s.text_display),
            like_count: s.like_count,
            published_at: s.published_at,
            author_image: s.author_profile_image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatResponse {
    #[serde(default)]
    items: Vec<LiveChatResource>,
    next_page_token: Option<String>,
    polling_interval_millis: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatResource {
    id: String,
    #[serde(default)]
    snippet: LiveChatSnippet,
    #[serde(default)]
    author_details: AuthorDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LiveChatSnippet {
    display_message: String,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AuthorDetails {
    display_name: String,
    profile_image_url: Option<String>,
}

impl From<LiveChatResponse> for ChatPage {
    fn from(resp: LiveChatResponse) -> Self {
        ChatPage {
            messages: resp
                .items
                .into_iter()
                .map(|item| LiveChatMessage {
                    id: item.id,
                    author: item.author_details.display_name,
                    message: item.snippet.display_message,
                    author_image: item.author_details.profile_image_url,
                    published_at: item.snippet.published_at,
                })
                .collect(),
            next_page_token: resp.next_page_token,
            polling_interval_ms: resp.polling_interval_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode<T: DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_playlist_items_map_to_videos() {
        let resp: ListResponse<PlaylistItemResource> = decode(json!({
            "nextPageToken": "CAwQAA",
            "items": [{
                "snippet": {
                    "title": "Rotational Motion L1",
                    "description": "Lecture 1",
                    "channelId": "UC1",
                    "channelTitle": "Physics",
                    "publishedAt": "2024-05-02T10:00:00Z",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/d.jpg" },
                        "medium": { "url": "https://i.ytimg.com/m.jpg" }
                    }
                },
                "contentDetails": {
                    "videoId": "vid1",
                    "videoPublishedAt": "2024-05-01T08:30:00Z"
                }
            }]
        }));

        assert_eq!(resp.next_page_token.as_deref(), Some("CAwQAA"));
        let item = FeedItem::from(resp.items.into_iter().next().unwrap());
        assert_eq!(item.id, "vid1");
        assert_eq!(item.kind, ContentKind::Video);
        assert_eq!(item.thumbnail.as_deref(), Some("https://i.ytimg.com/m.jpg"));
        assert_eq!(
            item.published_at.unwrap().to_rfc3339(),
            "2024-05-01T08:30:00+00:00"
        );
    }

    #[test]
    fn test_search_skips_results_without_video_id() {
        let resp: ListResponse<SearchResource> = decode(json!({
            "items": [
                { "id": { "kind": "youtube#channel" }, "snippet": { "title": "A channel" } },
                { "id": { "videoId": "live1" }, "snippet": { "title": "Live class" } }
            ]
        }));
        let items: Vec<FeedItem> = resp
            .items
            .into_iter()
            .filter_map(|i| i.into_feed_item(ContentKind::LiveNow))
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "live1");
        assert_eq!(items[0].kind, ContentKind::LiveNow);
    }

    /// Answers a single request on a loopback port and returns its head
    fn serve_once(status: &str, body: String) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.is_empty() || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            stream.write_all(response.as_bytes()).unwrap();
            head
        });
        (base, server)
    }

    #[tokio::test]
    async fn test_uploads_lookup_is_cached() {
        let body = json!({
            "items": [{ "contentDetails": { "relatedPlaylists": { "uploads": "UU123" } } }]
        });
        let (base, server) = serve_once("200 OK", body.to_string());
        let client = YouTubeClient::new(Some("k1".into()))
            .unwrap()
            .with_base_url(&base)
            .with_bearer(Some("t1".into()));

        assert_eq!(client.uploads_playlist_id("UC123").await.unwrap(), "UU123");
        let head = server.join().unwrap();
        assert!(head.starts_with("GET /channels?"));
        assert!(head.contains("id=UC123"));
        assert!(head.contains("key=k1"));
        assert!(head.to_ascii_lowercase().contains("authorization: bearer t1"));

        // The listener is gone, so a second lookup must come from the cache
        assert_eq!(client.uploads_playlist_id("UC123").await.unwrap(), "UU123");
    }

    #[tokio::test]
    async fn test_expired_token_is_auth_failure() {
        let body = json!({ "error": { "code": 401, "message": "Invalid Credentials" } });
        let (base, server) = serve_once("401 Unauthorized", body.to_string());
        let client = YouTubeClient::new(None)
            .unwrap()
            .with_base_url(&base)
            .with_bearer(Some("stale".into()));

        let err = client.video_details("abc").await.unwrap_err();
        server.join().unwrap();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_video_details_with_live_chat() {
        let resp: ListResponse<VideoResource> = decode(json!({
            "items": [{
                "id": "v9",
                "snippet": { "title": "Doubt session", "channelTitle": "Xylem" },
                "statistics": { "viewCount": "12345" },
                "liveStreamingDetails": { "activeLiveChatId": "chat-42" }
            }]
        }));
        let details = VideoDetails::from(resp.items.into_iter().next().unwrap());
        assert_eq!(details.view_count, Some(12345));
        assert_eq!(details.live_chat_id.as_deref(), Some("chat-42"));
        assert_eq!(details.to_feed_item().kind, ContentKind::LiveNow);
    }

    #[test]
    fn test_playlist_item_count() {
        let resp: ListResponse<PlaylistResource> = decode(json!({
            "items": [{
                "id": "PL1",
                "snippet": { "title": "Optics", "channelTitle": "Physics" },
                "contentDetails": { "itemCount": 42 }
            }]
        }));
        let playlist = Playlist::from(resp.items.into_iter().next().unwrap());
        assert_eq!(playlist.item_count, 42);
        assert_eq!(playlist.title, "Optics");
    }

    #[test]
    fn test_comment_html_is_flattened() {
        let resp: ListResponse<CommentThreadResource> = decode(json!({
            "items": [{
                "id": "c1",
                "snippet": { "topLevelComment": { "snippet": {
                    "authorDisplayName": "@student",
                    "textDisplay": "Great lesson &amp; notes",
                    "likeCount": 7
                }}}
            }]
        }));
        let comment = Comment::from(resp.items.into_iter().next().unwrap());
        assert_eq!(comment.author, "@student");
        assert_eq!(comment.text, "Great lesson & notes");
        assert_eq!(comment.like_count, 7);
    }

    #[test]
    fn test_live_chat_page() {
        let resp: LiveChatResponse = decode(json!({
            "nextPageToken": "tok2",
            "pollingIntervalMillis": 2000,
            "items": [{
                "id": "m1",
                "snippet": { "displayMessage": "hello" },
                "authorDetails": { "displayName": "viewer" }
            }]
        }));
        let page = ChatPage::from(resp);
        assert_eq!(page.polling_interval_ms, Some(2000));
        assert_eq!(page.next_page_token.as_deref(), Some("tok2"));
        assert_eq!(page.messages[0].message, "hello");
        assert_eq!(page.messages[0].author, "viewer");
    }

    #[test]
    fn test_error_envelope_message() {
        let err = parse_error_body(
            403,
            r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota."}}"#,
        );
        assert_eq!(
            err,
            ApiError::Status {
                status: 403,
                message: "The request cannot be completed because you have exceeded your quota."
                    .into()
            }
        );

        let err = parse_error_body(500, "");
        assert_eq!(err.to_string(), "500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_requires_key_or_token() {
        let client = YouTubeClient::new(None).unwrap();
        let err = client.video_details("abc").await.unwrap_err();
        assert_eq!(err, ApiError::Unauthenticated);
    }
}
