//! Commands over local data: notes, history, analytics, theme, quotes.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::context::AppContext;

pub fn notes_list(ctx: &AppContext, video_id: Option<&str>) -> Result<()> {
    let printer = ctx.printer();
    match video_id {
        Some(video_id) => printer.notes(&ctx.notes.list(video_id)),
        None => {
            let videos = ctx.notes.videos_with_notes()?;
            if videos.is_empty() {
                println!("No notes yet.");
            }
            for video_id in videos {
                let title = title_for(ctx, &video_id).unwrap_or_else(|| video_id.clone());
                printer.heading(&title);
                printer.notes(&ctx.notes.list(&video_id));
                println!();
            }
        }
    }
    Ok(())
}

pub fn notes_add(ctx: &AppContext, video_id: &str, at: f64, text: &str) -> Result<()> {
    match ctx.notes.add(video_id, text, at)? {
        Some(note) => println!("Saved note at {} ({})", note.formatted_time(), note.short_id()),
        None => bail!("note text is empty"),
    }
    Ok(())
}

pub fn notes_delete(ctx: &AppContext, video_id: &str, note_id: &str) -> Result<()> {
    match ctx.notes.delete(video_id, note_id)? {
        Some(note) => println!("Deleted note at {}", note.formatted_time()),
        None => bail!("no single note on {} matches '{}'", video_id, note_id),
    }
    Ok(())
}

pub fn notes_export(ctx: &AppContext, video_id: &str, output: Option<&Path>) -> Result<()> {
    let title = title_for(ctx, video_id);
    let markdown = ctx.notes.export_markdown(video_id, title.as_deref());
    match output {
        Some(path) => {
            std::fs::write(path, &markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported notes to {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

/// Title from history, when the video was watched here
fn title_for(ctx: &AppContext, video_id: &str) -> Option<String> {
    ctx.history
        .list()
        .into_iter()
        .find(|e| e.video.id == video_id)
        .map(|e| e.video.title)
}

pub fn history(ctx: &AppContext, clear: bool) -> Result<()> {
    if clear {
        ctx.history.clear()?;
        println!("Watch history cleared.");
        return Ok(());
    }
    ctx.printer().history(&ctx.history.list());
    Ok(())
}

pub fn analytics(ctx: &AppContext) -> Result<()> {
    let summary = ctx.tracker.summary();
    let last = ctx.tracker.last_watched();
    let last = last
        .as_ref()
        .map(|last| (last, ctx.tracker.watched_seconds(&last.video_id)));
    ctx.printer().analytics(&summary, last);
    Ok(())
}

pub fn theme(ctx: &AppContext, toggle: bool) -> Result<()> {
    let theme = if toggle {
        ctx.themes.toggle()?
    } else {
        ctx.themes.get()
    };
    ctx.printer().heading(&format!("Theme: {}", theme.name()));
    Ok(())
}

pub fn quote(ctx: &AppContext) -> Result<()> {
    let quote = services::quotes::random();
    ctx.printer().heading(&format!("\"{}\"", quote.text));
    println!("  - {}", quote.author);
    Ok(())
}
