//! Playback heartbeat.
//!
//! A background task follows the player state on a `watch` channel. While the
//! state is `Playing` it ticks once per period and records a watched minute;
//! any other state stops the timer and the next `Playing` starts a fresh
//! period. The task ends when the sender is dropped.

use crate::tracker::Tracker;
use shared::types::PlayerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Spawn the heartbeat for one video. The handle resolves to the number of
/// ticks recorded.
pub fn spawn_heartbeat(
    tracker: Arc<Tracker>,
    video_id: String,
    period: Duration,
    mut player: watch::Receiver<PlayerState>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let tick_secs = period.as_secs().max(1);
        let mut ticks = 0u64;

        loop {
            // Idle until playback (re)starts
            loop {
                let playing = player.borrow_and_update().is_playing();
                if playing {
                    break;
                }
                if player.changed().await.is_err() {
                    return ticks;
                }
            }

            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!("heartbeat started for {}", video_id);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match tracker.record_heartbeat(&video_id, tick_secs) {
                            Ok(state) => {
                                ticks += 1;
                                debug!("heartbeat {} (total {} min)", video_id, state.total_minutes);
                            }
                            Err(e) => warn!("failed to record heartbeat: {}", e),
                        }
                    }
                    changed = player.changed() => {
                        if changed.is_err() {
                            return ticks;
                        }
                        let playing = player.borrow_and_update().is_playing();
                        if !playing {
                            debug!("heartbeat paused for {}", video_id);
                            break;
                        }
                    }
                }
            }
        }
    })
}
