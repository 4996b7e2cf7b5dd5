//! Wiring for one CLI invocation: settings, local stores and API clients.

use anyhow::{bail, Context, Result};
use providers::gemini::CommentAnalyzer;
use providers::youtube::YouTubeClient;
use services::feed::ChannelFilter;
use services::history::WatchHistory;
use services::notes::NotesStore;
use services::session::SessionStore;
use services::storage::KvStore;
use services::theme::ThemeStore;
use services::tracker::Tracker;
use shared::settings::AppSettings;
use std::sync::Arc;

use crate::render::Printer;
use crate::utils;

pub struct AppContext {
    pub settings: AppSettings,
    pub sessions: SessionStore,
    pub history: WatchHistory,
    pub notes: NotesStore,
    pub tracker: Arc<Tracker>,
    pub themes: ThemeStore,
}

impl AppContext {
    pub fn open(settings: AppSettings) -> Result<Self> {
        let dir = utils::data_dir(&settings);
        let store = Arc::new(
            KvStore::open(&dir)
                .with_context(|| format!("opening data directory {}", dir.display()))?,
        );
        tracing::debug!("data directory: {}", dir.display());

        Ok(Self {
            settings,
            sessions: SessionStore::new(store.clone()),
            history: WatchHistory::new(store.clone()),
            notes: NotesStore::new(store.clone()),
            tracker: Arc::new(Tracker::new(store.clone())),
            themes: ThemeStore::new(store),
        })
    }

    /// API client carrying the configured key and, when signed in, the
    /// session's bearer token.
    pub fn youtube(&self) -> Result<YouTubeClient> {
        let client = YouTubeClient::new(self.settings.youtube_api_key.clone())?
            .with_bearer(self.sessions.bearer());
        if !client.is_authorized() {
            tracing::warn!(
                "no YouTube API key configured and not signed in; requests will fail"
            );
        }
        Ok(client)
    }

    pub fn analyzer(&self) -> CommentAnalyzer {
        CommentAnalyzer::new(&self.settings.gemini_model, &self.settings.gemini_auth)
    }

    pub fn printer(&self) -> Printer {
        Printer::new(self.themes.get())
    }

    /// Resolve `--channel NAME` against the curated list.
    pub fn channel_filter(&self, name: Option<&str>) -> Result<ChannelFilter> {
        let Some(name) = name else {
            return Ok(ChannelFilter::All);
        };
        match self.settings.channel_by_name(name) {
            Some(channel) => Ok(ChannelFilter::Only(channel.clone())),
            None => {
                let known: Vec<&str> = self
                    .settings
                    .channels
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect();
                bail!("unknown channel '{}' (known: {})", name, known.join(", "))
            }
        }
    }
}
