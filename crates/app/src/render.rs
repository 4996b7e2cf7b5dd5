//! Terminal output, colored with the active theme's accent.

use chrono::Utc;
use providers::gemini::CommentAnalysis;
use services::history::WatchHistoryEntry;
use services::notes::Note;
use services::theme::Theme;
use services::tracker::{AnalyticsSummary, LastWatched};
use shared::types::{watch_url, ContentKind, FeedItem, LiveChatMessage, Playlist, VideoDetails};
use std::io::IsTerminal;

use crate::utils::{format_views, relative_time, truncate_chars};

const TITLE_WIDTH: usize = 80;
const BAR_WIDTH: u64 = 30;

pub struct Printer {
    theme: Theme,
    color: bool,
}

impl Printer {
    pub fn new(theme: Theme) -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { theme, color }
    }

    fn accent(&self, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", self.theme.accent(), text)
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            format!("\x1b[2m{}\x1b[0m", text)
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) {
        println!("{}", self.accent(text));
    }

    /// Upstream failure shown above a (possibly partial) listing
    pub fn banner(&self, message: &str) {
        println!("! {}", message);
    }

    pub fn feed(&self, items: &[FeedItem]) {
        if items.is_empty() {
            println!("No videos found.");
            return;
        }
        let now = Utc::now();
        for (i, item) in items.iter().enumerate() {
            let badge = match item.kind {
                ContentKind::LiveNow => format!("[{}] ", self.accent(item.kind.label())),
                ContentKind::LiveArchive => "[live archive] ".to_string(),
                ContentKind::Video => String::new(),
            };
            println!(
                "{:>3}. {}{}",
                i + 1,
                badge,
                truncate_chars(&item.title, TITLE_WIDTH)
            );
            let age = item
                .published_at
                .map(|at| relative_time(at, now))
                .unwrap_or_default();
            println!(
                "     {}",
                self.dim(&format!("{} · {} · {}", item.channel_title, age, item.id))
            );
        }
    }

    pub fn playlists(&self, playlists: &[Playlist]) {
        if playlists.is_empty() {
            println!("No playlists found.");
            return;
        }
        for playlist in playlists {
            println!(
                "{}  {}",
                truncate_chars(&playlist.title, TITLE_WIDTH),
                self.dim(&format!("({} videos)", playlist.item_count))
            );
            println!("     {}", self.dim(&format!("{} · {}", playlist.channel_title, playlist.id)));
        }
    }

    pub fn video(&self, details: &VideoDetails) {
        self.heading(&details.title);
        let mut meta = vec![details.channel_title.clone()];
        if let Some(views) = details.view_count {
            meta.push(format_views(views));
        }
        if let Some(at) = details.published_at {
            meta.push(relative_time(at, Utc::now()));
        }
        if details.live_chat_id.is_some() {
            meta.push(self.accent("LIVE"));
        }
        println!("{}", meta.join(" · "));
        println!("{}", watch_url(&details.id));
        if !details.description.is_empty() {
            println!();
            println!("{}", truncate_chars(details.description.trim(), 400));
        }
    }

    pub fn analysis(&self, analysis: &CommentAnalysis) {
        println!();
        self.heading("What viewers are saying");
        println!("{}", analysis.summary);
        for highlight in &analysis.highlights {
            println!("  * {}: {}", highlight.author, highlight.text);
        }
    }

    pub fn notes(&self, notes: &[Note]) {
        if notes.is_empty() {
            println!("No notes yet.");
            return;
        }
        for note in notes {
            println!(
                "[{}] {}  {}",
                self.accent(&note.formatted_time()),
                note.text,
                self.dim(&note.short_id())
            );
        }
    }

    pub fn chat_message(&self, message: &LiveChatMessage) {
        println!("{} {}", self.accent(&format!("{}:", message.author)), message.message);
    }

    pub fn history(&self, entries: &[WatchHistoryEntry]) {
        if entries.is_empty() {
            println!("No watch history.");
            return;
        }
        let now = Utc::now();
        for entry in entries {
            println!("{}", truncate_chars(&entry.video.title, TITLE_WIDTH));
            println!(
                "     {}",
                self.dim(&format!(
                    "{} · watched {} · {}",
                    entry.video.channel_title,
                    relative_time(entry.watched_at, now),
                    entry.video.id
                ))
            );
        }
    }

    /// `last` carries the last-watched video and the seconds tracked on it
    pub fn analytics(&self, summary: &AnalyticsSummary, last: Option<(&LastWatched, u64)>) {
        self.heading("Study time");
        println!("Total: {}", summary.total_formatted());
        println!("Today: {} min", summary.today_minutes);
        println!();

        let max = summary
            .last_7_days
            .iter()
            .map(|d| d.minutes)
            .max()
            .unwrap_or(0)
            .max(1);
        for day in &summary.last_7_days {
            let filled = (day.minutes * BAR_WIDTH / max) as usize;
            let bar = format!("{:<width$}", "#".repeat(filled), width = BAR_WIDTH as usize);
            println!("{} {} {} min", day.label, self.accent(&bar), day.minutes);
        }

        if let Some((last, watched_secs)) = last {
            println!();
            println!(
                "Continue: {} at {}, {} min studied (focustube watch {})",
                last.title,
                services::notes::format_timestamp(last.position_secs as f64),
                watched_secs / 60,
                last.video_id
            );
        }
    }
}
