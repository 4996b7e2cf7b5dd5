//! Traits the local services use to reach the video platform.
//!
//! `providers::youtube::YouTubeClient` is the real implementation; tests
//! plug in in-memory fakes.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{ChatPage, FeedItem, Page};

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Videos from the channel's uploads playlist, newest first
    async fn channel_uploads(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Page<FeedItem>, ApiError>;

    /// Completed live streams, newest first
    async fn live_archives(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<FeedItem>, ApiError>;

    /// Streams broadcasting right now
    async fn active_live(&self, channel_id: &str) -> Result<Vec<FeedItem>, ApiError>;
}

#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn live_chat_messages(
        &self,
        live_chat_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChatPage, ApiError>;
}
