use anyhow::Result;
use clap::{Parser, Subcommand};
use services::feed::FeedTab;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod render;
mod utils;

use commands::{account, browse, library, watch};
use context::AppContext;

#[derive(Parser, Debug)]
#[command(
    name = "focustube",
    version,
    about = "Distraction-free study companion for a curated set of YouTube channels"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with Google (read-only YouTube access)
    Login,
    /// Forget the stored session
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// Latest uploads and streams from the curated channels
    Feed {
        /// Only this channel (name or id)
        #[arg(long)]
        channel: Option<String>,
        /// home, videos or live
        #[arg(long, default_value = "home")]
        tab: FeedTab,
        /// Continue a single-channel feed
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Search videos
    Search {
        query: String,
        #[arg(long)]
        channel: Option<String>,
        /// Only videos published in the last N days
        #[arg(long)]
        days: Option<i64>,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Playlists of the curated channels
    Playlists {
        #[arg(long)]
        channel: Option<String>,
    },
    /// Videos in one playlist
    Playlist {
        id: String,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Watch a video in the browser and track study time from the terminal
    Watch {
        id: String,
        /// Follow the live chat while playing
        #[arg(long)]
        chat: bool,
        /// Start position (90, 1:30 or 01:02:05); defaults to where you left off
        #[arg(long, value_parser = parse_start)]
        start: Option<u64>,
    },
    /// Timestamped notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
    /// Recently watched videos
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Study time totals and the last seven days
    Analytics,
    /// Show or cycle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// A motivational quote
    Quote,
}

#[derive(Subcommand, Debug)]
enum NotesAction {
    /// Notes for one video, or for every video with notes
    List { video_id: Option<String> },
    Add {
        video_id: String,
        /// Position in the video (90, 1:30 or 01:02:05)
        #[arg(long, default_value = "0", value_parser = parse_at)]
        at: f64,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete by id (the short id shown in listings is enough)
    Delete { video_id: String, note_id: String },
    /// Markdown export
    Export {
        video_id: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn parse_at(s: &str) -> Result<f64, String> {
    utils::parse_timestamp(s).ok_or_else(|| format!("invalid time '{}'", s))
}

fn parse_start(s: &str) -> Result<u64, String> {
    parse_at(s).map(|secs| secs as u64)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (settings, found) = utils::load_settings_or_default();
    if !found {
        // First run: write the defaults so the file can be edited
        match utils::save_settings(&settings) {
            Ok(()) => {
                if let Some(path) = utils::config_path() {
                    tracing::info!("wrote default settings to {}", path.display());
                }
            }
            Err(e) => tracing::warn!("could not save default settings: {:#}", e),
        }
    }
    let ctx = AppContext::open(settings)?;

    match cli.command {
        Command::Login => account::login(&ctx).await,
        Command::Logout => account::logout(&ctx),
        Command::Whoami => account::whoami(&ctx),
        Command::Feed {
            channel,
            tab,
            page_token,
        } => browse::feed(&ctx, channel.as_deref(), tab, page_token.as_deref()).await,
        Command::Search {
            query,
            channel,
            days,
            page_token,
        } => {
            browse::search(
                &ctx,
                &query,
                channel.as_deref(),
                days,
                page_token.as_deref(),
            )
            .await
        }
        Command::Playlists { channel } => browse::playlists(&ctx, channel.as_deref()).await,
        Command::Playlist { id, page_token } => {
            browse::playlist(&ctx, &id, page_token.as_deref()).await
        }
        Command::Watch { id, chat, start } => watch::run(&ctx, &id, chat, start).await,
        Command::Notes { action } => match action {
            NotesAction::List { video_id } => library::notes_list(&ctx, video_id.as_deref()),
            NotesAction::Add { video_id, at, text } => {
                library::notes_add(&ctx, &video_id, at, &text.join(" "))
            }
            NotesAction::Delete { video_id, note_id } => {
                library::notes_delete(&ctx, &video_id, &note_id)
            }
            NotesAction::Export { video_id, output } => {
                library::notes_export(&ctx, &video_id, output.as_deref())
            }
        },
        Command::History { clear } => library::history(&ctx, clear),
        Command::Analytics => library::analytics(&ctx),
        Command::Theme { toggle } => library::theme(&ctx, toggle),
        Command::Quote => library::quote(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_feed_args() {
        let cli = Cli::try_parse_from([
            "focustube",
            "feed",
            "--channel",
            "Physics Wallah JEE",
            "--tab",
            "live",
        ])
        .unwrap();
        match cli.command {
            Command::Feed { channel, tab, page_token } => {
                assert_eq!(channel.as_deref(), Some("Physics Wallah JEE"));
                assert_eq!(tab, FeedTab::Live);
                assert!(page_token.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_note_add() {
        let cli = Cli::try_parse_from([
            "focustube", "notes", "add", "abc123", "--at", "1:30", "check", "units",
        ])
        .unwrap();
        match cli.command {
            Command::Notes {
                action: NotesAction::Add { video_id, at, text },
            } => {
                assert_eq!(video_id, "abc123");
                assert_eq!(at, 90.0);
                assert_eq!(text.join(" "), "check units");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_tab() {
        assert!(Cli::try_parse_from(["focustube", "feed", "--tab", "shorts"]).is_err());
    }
}
