//! Utility functions for the FocusTube CLI
//!
//! Settings persistence plus the small formatting helpers used when printing
//! feeds, notes and analytics.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use services::storage::KvStore;
use shared::settings::AppSettings;
use std::path::{Path, PathBuf};

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("focustube");
        p.push("settings.json");
        p
    })
}

/// Load settings from disk or return defaults.
///
/// The flag tells whether a settings file was found. Environment overrides
/// are applied either way.
pub fn load_settings_or_default() -> (AppSettings, bool) {
    let loaded = config_path().and_then(|path| load_settings_from(&path));
    let found = loaded.is_some();
    let mut settings = loaded.unwrap_or_default();
    settings.apply_env();
    (settings, found)
}

pub fn load_settings_from(path: &Path) -> Option<AppSettings> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<AppSettings>(&contents) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("ignoring unreadable settings at {}: {}", path.display(), e);
            None
        }
    }
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<()> {
    let path = config_path().context("no config directory on this platform")?;
    save_settings_to(&path, settings)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Directory for the local stores
pub fn data_dir(settings: &AppSettings) -> PathBuf {
    settings
        .data_dir
        .as_deref()
        .map(expand_user_path)
        .unwrap_or_else(KvStore::default_dir)
}

/// Expand a leading `~` to the home directory
pub fn expand_user_path(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(input)
}

/// Human-readable age, e.g. "3 days ago"
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(timestamp);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        if mins == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", mins)
        }
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        if days == 1 {
            "yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        timestamp.format("%b %d, %Y").to_string()
    }
}

/// "1.2M views"
pub fn format_views(count: u64) -> String {
    let short = if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    };
    format!("{} views", short.replace(".0", ""))
}

/// Parse "90", "1:30" or "01:02:05" into seconds
pub fn parse_timestamp(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if !input.contains(':') {
        return input.parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0);
    }

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut total = 0u64;
    for part in parts {
        let value: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total as f64)
}

/// Cut to `max` characters, marking the cut with "..."
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
