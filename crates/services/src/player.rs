//! Playback position estimate.
//!
//! The embedded player runs outside this process, so the position is derived
//! from time spent in `Playing` since the last known position.

use shared::types::PlayerState;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlayerState,
    /// Position when the clock last left or entered `Playing`
    anchor: Duration,
    playing_since: Option<Instant>,
}

impl PlaybackClock {
    pub fn new(start_secs: u64) -> Self {
        Self {
            state: PlayerState::Unstarted,
            anchor: Duration::from_secs(start_secs),
            playing_since: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn set_state(&mut self, state: PlayerState, now: Instant) {
        self.anchor = self.position_dur(now);
        self.playing_since = state.is_playing().then_some(now);
        self.state = state;
    }

    /// Jump to `secs`; a playing clock keeps running from there.
    pub fn seek(&mut self, secs: f64, now: Instant) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.anchor = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        if self.playing_since.is_some() {
            self.playing_since = Some(now);
        }
    }

    /// Seconds into the video at `now`
    pub fn position_at(&self, now: Instant) -> f64 {
        self.position_dur(now).as_secs_f64()
    }

    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    fn position_dur(&self, now: Instant) -> Duration {
        match self.playing_since {
            Some(since) => self
                .anchor
                .saturating_add(now.saturating_duration_since(since)),
            None => self.anchor,
        }
    }
}
