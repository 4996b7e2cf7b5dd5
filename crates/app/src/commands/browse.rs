//! Read-only browsing: feed, search and playlists.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use services::feed::{FeedAggregator, FeedCursor, FeedTab};
use shared::error::ApiError;
use shared::types::Playlist;

use crate::context::AppContext;

pub async fn feed(
    ctx: &AppContext,
    channel: Option<&str>,
    tab: FeedTab,
    page_token: Option<&str>,
) -> Result<()> {
    let client = ctx.youtube()?;
    let printer = ctx.printer();
    let filter = ctx.channel_filter(channel)?;
    let channels = filter.select(&ctx.settings.channels);
    let cursor = page_token
        .map(|t| FeedCursor::decode(t).context("invalid page token"))
        .transpose()?;

    let feed = FeedAggregator::new(&client, ctx.settings.page_size)
        .load(&channels, tab, cursor.as_ref())
        .await;

    if let Some(banner) = &feed.banner {
        printer.banner(banner);
    }
    printer.feed(&feed.items);

    if let Some(next) = feed.next {
        println!();
        println!(
            "More: focustube feed --channel '{}' --tab {} --page-token {}",
            channels.first().map(|c| c.name.as_str()).unwrap_or_default(),
            tab,
            next.encode()
        );
    }
    Ok(())
}

pub async fn search(
    ctx: &AppContext,
    query: &str,
    channel: Option<&str>,
    days: Option<i64>,
    page_token: Option<&str>,
) -> Result<()> {
    let client = ctx.youtube()?;
    let printer = ctx.printer();
    let channel_id = channel
        .map(|name| {
            ctx.settings
                .channel_by_name(name)
                .map(|c| c.id.clone())
                .with_context(|| format!("unknown channel '{}'", name))
        })
        .transpose()?;
    let published_after = days.map(published_since).transpose()?;

    match client
        .search_videos(query, channel_id.as_deref(), published_after, page_token)
        .await
    {
        Ok(page) => {
            printer.feed(&page.items);
            if let Some(next) = page.next_page_token {
                println!();
                println!("More: --page-token {}", next);
            }
        }
        Err(e) => {
            tracing::warn!("search failed: {}", e);
            printer.banner(&error_banner(&e));
            printer.feed(&[]);
        }
    }
    Ok(())
}

fn error_banner(e: &ApiError) -> String {
    if e.is_auth_failure() {
        format!("{} (run `focustube login` or set an API key)", e)
    } else {
        e.to_string()
    }
}

/// Start of a "last N days" window
fn published_since(days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(days.max(0))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .with_context(|| format!("--days {} is out of range", days))
}

pub async fn playlists(ctx: &AppContext, channel: Option<&str>) -> Result<()> {
    let client = ctx.youtube()?;
    let printer = ctx.printer();
    let filter = ctx.channel_filter(channel)?;
    let channels = filter.select(&ctx.settings.channels);

    let results = join_all(
        channels
            .iter()
            .map(|c| client.channel_playlists(&c.id, None)),
    )
    .await;

    let mut all: Vec<Playlist> = Vec::new();
    let mut banner: Option<String> = None;
    for result in results {
        match result {
            Ok(page) => all.extend(page.items),
            Err(e) => {
                tracing::warn!("playlist fetch failed: {}", e);
                if banner.is_none() {
                    banner = Some(error_banner(&e));
                }
            }
        }
    }

    if let Some(banner) = &banner {
        printer.banner(banner);
    }
    printer.playlists(&all);
    Ok(())
}

pub async fn playlist(ctx: &AppContext, playlist_id: &str, page_token: Option<&str>) -> Result<()> {
    let client = ctx.youtube()?;
    let printer = ctx.printer();

    let (details, items) = futures::join!(
        client.playlist_details(playlist_id),
        client.playlist_page(playlist_id, page_token)
    );

    match details {
        Ok(Some(playlist)) => {
            printer.heading(&playlist.title);
            println!("{} · {} videos", playlist.channel_title, playlist.item_count);
            println!();
        }
        Ok(None) => printer.banner(&format!("playlist {} not found", playlist_id)),
        Err(e) => {
            tracing::warn!("playlist lookup failed: {}", e);
            printer.banner(&error_banner(&e));
        }
    }

    match items {
        Ok(page) => {
            printer.feed(&page.items);
            if let Some(next) = page.next_page_token {
                println!();
                println!("More: focustube playlist {} --page-token {}", playlist_id, next);
            }
        }
        Err(e) => {
            tracing::warn!("playlist items failed: {}", e);
            printer.feed(&[]);
        }
    }
    Ok(())
}
