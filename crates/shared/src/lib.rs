pub mod error;
pub mod source;
pub mod types;

pub mod settings {
    use serde::{Deserialize, Serialize};

    use crate::types::Channel;

    fn default_page_size() -> u32 {
        12
    }

    fn default_heartbeat_secs() -> u64 {
        60
    }

    fn default_chat_poll_floor_ms() -> u64 {
        5_000
    }

    fn default_channels() -> Vec<Channel> {
        vec![
            Channel::new("UCVJU_IChPMOe8RWkdVQjtfQ", "Physics Wallah JEE"),
            Channel::new("UCaQhwo6un90JE2nDGdtJIIw", "Xylem JEE & KEAM 2026"),
        ]
    }

    fn default_gemini_model() -> String {
        "gemini-1.5-flash".into()
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OAuthCredentials {
        pub access_token: String,
        pub refresh_token: Option<String>,
        pub expires_at: Option<i64>, // Unix timestamp
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
        pub oauth: Option<OAuthCredentials>,
    }

    /// Google OAuth client registration used by `focustube login`
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct OAuthClientSettings {
        pub client_id: Option<String>,
        pub client_secret: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        /// YouTube Data API key, sent as `key=` on every request
        #[serde(default)]
        pub youtube_api_key: Option<String>,
        #[serde(default)]
        pub oauth: OAuthClientSettings,
        #[serde(default = "default_gemini_model")]
        pub gemini_model: String,
        #[serde(default)]
        pub gemini_auth: ProviderAuth,
        /// Curated channels shown in the feed
        #[serde(default = "default_channels")]
        pub channels: Vec<Channel>,
        #[serde(default = "default_page_size")]
        pub page_size: u32,
        #[serde(default = "default_heartbeat_secs")]
        pub heartbeat_secs: u64,
        #[serde(default = "default_chat_poll_floor_ms")]
        pub chat_poll_floor_ms: u64,
        /// Overrides the platform data directory for local stores
        #[serde(default)]
        pub data_dir: Option<String>,
    }

    impl AppSettings {
        pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
            self.channels
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name) || c.id == name)
        }

        /// Apply `YOUTUBE_API_KEY`, `GEMINI_API_KEY`, `GOOGLE_CLIENT_ID`,
        /// `GOOGLE_CLIENT_SECRET` and `FOCUSTUBE_DATA_DIR` on top of the file values.
        pub fn apply_env(&mut self) {
            if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
                self.youtube_api_key = Some(key);
            }
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                self.gemini_auth.api_key = Some(key);
            }
            if let Ok(id) = std::env::var("GOOGLE_CLIENT_ID") {
                self.oauth.client_id = Some(id);
            }
            if let Ok(secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
                self.oauth.client_secret = Some(secret);
            }
            if let Ok(dir) = std::env::var("FOCUSTUBE_DATA_DIR") {
                self.data_dir = Some(dir);
            }
        }
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                youtube_api_key: None,
                oauth: OAuthClientSettings::default(),
                gemini_model: default_gemini_model(),
                gemini_auth: ProviderAuth::default(),
                channels: default_channels(),
                page_size: default_page_size(),
                heartbeat_secs: default_heartbeat_secs(),
                chat_poll_floor_ms: default_chat_poll_floor_ms(),
                data_dir: None,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults_fill_missing_fields() {
            let settings: AppSettings = serde_json::from_str("{}").unwrap();
            assert_eq!(settings.channels.len(), 2);
            assert_eq!(settings.page_size, 12);
            assert_eq!(settings.heartbeat_secs, 60);
            assert_eq!(settings.chat_poll_floor_ms, 5_000);
            assert_eq!(settings.gemini_model, "gemini-1.5-flash");
        }

        #[test]
        fn test_channel_by_name() {
            let settings = AppSettings::default();
            assert!(settings.channel_by_name("physics wallah jee").is_some());
            assert!(settings.channel_by_name("UCaQhwo6un90JE2nDGdtJIIw").is_some());
            assert!(settings.channel_by_name("Nope").is_none());
        }
    }
}
