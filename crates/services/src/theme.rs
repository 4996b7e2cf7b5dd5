//! Display theme, persisted under `theme`.

use crate::storage::{KvStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Amoled,
    Light,
}

impl Theme {
    /// Dark -> Amoled -> Light -> Dark
    pub fn next(self) -> Self {
        match self {
            Theme::Dark => Theme::Amoled,
            Theme::Amoled => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Amoled => "amoled",
            Theme::Light => "light",
        }
    }

    /// ANSI SGR parameters for headings in terminal output
    pub fn accent(self) -> &'static str {
        match self {
            Theme::Dark => "1;36",
            Theme::Amoled => "1;97",
            Theme::Light => "1;34",
        }
    }
}

pub struct ThemeStore {
    store: Arc<KvStore>,
}

impl ThemeStore {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Theme {
        self.store.get_or_default::<Option<Theme>>(THEME_KEY).unwrap_or_default()
    }

    pub fn set(&self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, &theme)
    }

    /// Advance to the next theme and persist it
    pub fn toggle(&self) -> Result<Theme, StoreError> {
        let next = self.get().next();
        self.set(next)?;
        Ok(next)
    }
}
