//! Signed-in session: the OAuth access token plus the cached Google profile.

use crate::storage::{KvStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::UserProfile;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const PROFILE_KEY: &str = "user_profile";
pub const TOKEN_KEY: &str = "access_token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: StoredToken,
    pub profile: UserProfile,
}

pub struct SessionStore {
    store: Arc<KvStore>,
}

impl SessionStore {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Persist a fresh sign-in.
    pub fn login(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<Duration>,
        profile: UserProfile,
    ) -> Result<Session, StoreError> {
        let expires_at = expires_in
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| Utc::now() + d);
        let token = StoredToken {
            access_token,
            refresh_token,
            expires_at,
        };

        self.store.set(PROFILE_KEY, &profile)?;
        self.store.set(TOKEN_KEY, &token)?;
        info!("signed in as {}", profile.display_name());
        Ok(Session { token, profile })
    }

    pub fn restore(&self) -> Option<Session> {
        self.restore_at(Utc::now())
    }

    /// Load the stored session; an expired or half-written one is purged.
    pub fn restore_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let token: Option<StoredToken> = self.read(TOKEN_KEY);
        let profile: Option<UserProfile> = self.read(PROFILE_KEY);

        match (token, profile) {
            (Some(token), Some(profile)) if !token.is_expired(now) => {
                Some(Session { token, profile })
            }
            (Some(token), _) if token.is_expired(now) => {
                info!("stored access token expired; clearing session");
                self.purge();
                None
            }
            (None, None) => None,
            _ => {
                warn!("incomplete session in storage; clearing it");
                self.purge();
                None
            }
        }
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(PROFILE_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        info!("signed out");
        Ok(())
    }

    /// Token to attach as `Authorization: Bearer` on API calls.
    pub fn bearer(&self) -> Option<String> {
        self.restore().map(|s| s.token.access_token)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn purge(&self) {
        if let Err(e) = self.logout() {
            warn!("failed to clear session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<KvStore>, SessionStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(KvStore::open(temp_dir.path()).unwrap());
        let sessions = SessionStore::new(store.clone());
        (temp_dir, store, sessions)
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: "123".into(),
            email: Some("learner@example.com".into()),
            name: Some("Learner".into()),
            picture: None,
        }
    }

    #[test]
    fn test_login_then_restore() {
        let (_temp_dir, _store, sessions) = setup();
        sessions
            .login(
                "ya29.token".into(),
                None,
                Some(Duration::from_secs(3600)),
                profile(),
            )
            .unwrap();

        let session = sessions.restore().unwrap();
        assert_eq!(session.token.access_token, "ya29.token");
        assert_eq!(session.profile.display_name(), "Learner");
        assert_eq!(sessions.bearer().as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_expired_token_is_purged_on_load() {
        let (_temp_dir, store, sessions) = setup();
        sessions
            .login(
                "ya29.old".into(),
                None,
                Some(Duration::from_secs(60)),
                profile(),
            )
            .unwrap();

        let later = Utc::now() + chrono::Duration::hours(2);
        assert!(sessions.restore_at(later).is_none());
        assert!(store.get::<StoredToken>(TOKEN_KEY).unwrap().is_none());
        assert!(store.get::<UserProfile>(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_token_without_expiry_survives() {
        let (_temp_dir, _store, sessions) = setup();
        sessions
            .login("ya29.forever".into(), None, None, profile())
            .unwrap();
        let far_future = Utc::now() + chrono::Duration::days(365);
        assert!(sessions.restore_at(far_future).is_some());
    }

    #[test]
    fn test_profile_without_token_is_cleared() {
        let (_temp_dir, store, sessions) = setup();
        store.set(PROFILE_KEY, &profile()).unwrap();
        assert!(sessions.restore().is_none());
        assert!(store.get::<UserProfile>(PROFILE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_logout_clears_everything() {
        let (_temp_dir, _store, sessions) = setup();
        sessions
            .login("ya29.token".into(), None, None, profile())
            .unwrap();
        sessions.logout().unwrap();
        assert!(sessions.restore().is_none());
        assert!(sessions.bearer().is_none());
    }
}
