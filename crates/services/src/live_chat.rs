//! Live-chat polling for an active broadcast.
//!
//! Polls only while the player reports `Playing`. The wait between polls is
//! the server's suggested interval, never shorter than the configured floor.

use shared::source::ChatSource;
use shared::types::{LiveChatMessage, PlayerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

pub fn spawn_chat_poller(
    source: Arc<dyn ChatSource>,
    live_chat_id: String,
    floor: Duration,
    mut player: watch::Receiver<PlayerState>,
    messages: mpsc::UnboundedSender<LiveChatMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut page_token: Option<String> = None;
        let mut next_poll = Instant::now();

        loop {
            let playing = player.borrow_and_update().is_playing();
            if !playing {
                if player.changed().await.is_err() {
                    return;
                }
                continue;
            }

            // Wait for the scheduled poll; a state change re-checks playback
            tokio::select! {
                _ = time::sleep_until(next_poll) => {}
                changed = player.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }

            let delay = match source
                .live_chat_messages(&live_chat_id, page_token.as_deref())
                .await
            {
                Ok(page) => {
                    debug!("live chat: {} new messages", page.messages.len());
                    for message in page.messages {
                        if messages.send(message).is_err() {
                            return;
                        }
                    }
                    if page.next_page_token.is_some() {
                        page_token = page.next_page_token;
                    }
                    page.polling_interval_ms
                        .map(Duration::from_millis)
                        .unwrap_or(floor)
                        .max(floor)
                }
                Err(e) => {
                    warn!("live chat fetch failed: {}", e);
                    floor
                }
            };
            next_poll = Instant::now() + delay;
        }
    })
}
