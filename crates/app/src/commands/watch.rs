//! Interactive watch session.
//!
//! The video plays in the browser; the terminal drives the player state
//! (heartbeat and chat polling follow it) and takes notes at the current
//! position.

use anyhow::{Context, Result};
use chrono::Utc;
use providers::gemini::{CommentAnalysis, CommentAnalyzer};
use services::heartbeat::spawn_heartbeat;
use services::live_chat::spawn_chat_poller;
use services::player::PlaybackClock;
use services::tracker::LastWatched;
use shared::source::ChatSource;
use shared::types::{embed_url, Comment, LiveChatMessage, PlayerState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::utils::parse_timestamp;

const NO_COMMENTS: &str = "No comments to analyze.";

const HELP: &str =
    "commands: play | pause | buffer | end | seek TIME | note TEXT | notes | chat | status | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    State(PlayerState),
    Seek(f64),
    Note(String),
    Notes,
    Chat,
    Status,
    Help,
    Quit,
}

pub fn parse_player_command(line: &str) -> Result<PlayerCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "play" | "p" => PlayerCommand::State(PlayerState::Playing),
        "pause" => PlayerCommand::State(PlayerState::Paused),
        "buffer" => PlayerCommand::State(PlayerState::Buffering),
        "end" => PlayerCommand::State(PlayerState::Ended),
        "seek" => {
            let secs = parse_timestamp(rest)
                .ok_or_else(|| format!("seek needs a time like 90, 1:30 or 01:02:05, got '{}'", rest))?;
            PlayerCommand::Seek(secs)
        }
        "note" | "n" => {
            if rest.is_empty() {
                return Err("note needs some text".into());
            }
            PlayerCommand::Note(rest.to_string())
        }
        "notes" => PlayerCommand::Notes,
        "chat" => PlayerCommand::Chat,
        "status" => PlayerCommand::Status,
        "help" | "?" | "" => PlayerCommand::Help,
        "quit" | "q" | "exit" => PlayerCommand::Quit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(command)
}

async fn next_chat(rx: &mut Option<mpsc::UnboundedReceiver<LiveChatMessage>>) -> Option<LiveChatMessage> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn analyze_comments(analyzer: &CommentAnalyzer, comments: &[Comment]) -> CommentAnalysis {
    if comments.is_empty() {
        return CommentAnalysis::fallback(NO_COMMENTS);
    }
    analyzer.analyze(comments).await
}

pub async fn run(ctx: &AppContext, video_id: &str, chat: bool, start: Option<u64>) -> Result<()> {
    let client = Arc::new(ctx.youtube()?);
    let printer = ctx.printer();

    let details = client
        .video_details(video_id)
        .await
        .context("failed to load video")?
        .with_context(|| format!("video {} not found", video_id))?;

    let comments = client.comments(video_id).await.unwrap_or_else(|e| {
        warn!("failed to load comments: {}", e);
        Vec::new()
    });
    let analysis = analyze_comments(&ctx.analyzer(), &comments).await;

    printer.video(&details);
    printer.analysis(&analysis);

    let start_secs = start.unwrap_or_else(|| {
        ctx.tracker
            .last_watched()
            .filter(|last| last.video_id == video_id)
            .map(|last| last.position_secs)
            .unwrap_or(0)
    });
    let url = embed_url(video_id, start_secs);
    println!();
    println!("Player: {}", url);
    if let Err(e) = open::that(&url) {
        warn!("failed to open browser: {}", e);
    }

    if let Err(e) = ctx.history.add(&details.to_feed_item()) {
        warn!("failed to record history: {}", e);
    }

    let (state_tx, state_rx) = watch::channel(PlayerState::Unstarted);
    let heartbeat = spawn_heartbeat(
        ctx.tracker.clone(),
        video_id.to_string(),
        Duration::from_secs(ctx.settings.heartbeat_secs.max(1)),
        state_rx.clone(),
    );

    let mut chat_rx = None;
    let mut poller = None;
    if chat {
        match &details.live_chat_id {
            Some(live_chat_id) => {
                let (msg_tx, msg_rx) = mpsc::unbounded_channel();
                let source: Arc<dyn ChatSource> = client.clone();
                poller = Some(spawn_chat_poller(
                    source,
                    live_chat_id.clone(),
                    Duration::from_millis(ctx.settings.chat_poll_floor_ms),
                    state_rx.clone(),
                    msg_tx,
                ));
                chat_rx = Some(msg_rx);
            }
            None => println!("This video has no active live chat."),
        }
    }
    drop(state_rx);
    let mut show_chat = chat_rx.is_some();

    let mut clock = PlaybackClock::new(start_secs);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match parse_player_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };
                match command {
                    PlayerCommand::State(state) => {
                        clock.set_state(state, Instant::now());
                        state_tx.send_replace(state);
                        println!("{:?} at {}", state, services::notes::format_timestamp(clock.position()));
                    }
                    PlayerCommand::Seek(secs) => {
                        clock.seek(secs, Instant::now());
                        println!("Position {}", services::notes::format_timestamp(clock.position()));
                    }
                    PlayerCommand::Note(text) => {
                        match ctx.notes.add(video_id, &text, clock.position()) {
                            Ok(Some(note)) => println!("Noted at {}", note.formatted_time()),
                            Ok(None) => println!("note needs some text"),
                            Err(e) => warn!("failed to save note: {}", e),
                        }
                    }
                    PlayerCommand::Notes => printer.notes(&ctx.notes.list(video_id)),
                    PlayerCommand::Chat => {
                        if chat_rx.is_none() {
                            println!("Live chat is not running (start with --chat on a live video).");
                        } else {
                            show_chat = !show_chat;
                            println!("Live chat {}", if show_chat { "shown" } else { "hidden" });
                        }
                    }
                    PlayerCommand::Status => {
                        println!(
                            "{:?} at {} · {} min watched in total",
                            clock.state(),
                            services::notes::format_timestamp(clock.position()),
                            ctx.tracker.state().total_minutes
                        );
                    }
                    PlayerCommand::Help => println!("{}", HELP),
                    PlayerCommand::Quit => break,
                }
            }
            message = next_chat(&mut chat_rx) => {
                match message {
                    Some(message) if show_chat => printer.chat_message(&message),
                    Some(_) => {}
                    None => chat_rx = None,
                }
            }
        }
    }

    let position = clock.position();
    let last = LastWatched {
        video_id: video_id.to_string(),
        title: details.title.clone(),
        position_secs: position as u64,
        at: Utc::now(),
    };
    if let Err(e) = ctx.tracker.set_last_watched(&last) {
        warn!("failed to save position: {}", e);
    }

    // Dropping the sender ends both background tasks
    drop(state_tx);
    if let Some(poller) = poller {
        poller.abort();
    }
    let ticks = heartbeat.await.unwrap_or(0);
    info!("watch session for {} ended after {} heartbeat(s)", video_id, ticks);
    println!("Watched {} min this session.", ticks);
    Ok(())
}
