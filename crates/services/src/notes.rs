//! Timestamped notes, kept per video under `notes_<videoId>`.

use crate::storage::{KvStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const NOTES_PREFIX: &str = "notes_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub text: String,
    /// Seconds into the video when the note was taken
    pub timestamp: f64,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Position in the video as `HH:MM:SS`
    pub fn formatted_time(&self) -> String {
        format_timestamp(self.timestamp)
    }

    pub fn short_id(&self) -> String {
        self.id.to_string().chars().take(8).collect()
    }
}

pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

fn notes_key(video_id: &str) -> String {
    format!("{}{}", NOTES_PREFIX, video_id)
}

pub struct NotesStore {
    store: Arc<KvStore>,
}

impl NotesStore {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Add a note at `timestamp` seconds. Blank text is ignored and returns `None`.
    pub fn add(
        &self,
        video_id: &str,
        text: &str,
        timestamp: f64,
    ) -> Result<Option<Note>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let note = Note {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: timestamp.max(0.0),
            created_at: Utc::now(),
        };
        let stored = note.clone();
        self.store
            .update(&notes_key(video_id), move |notes: &mut Vec<Note>| {
                notes.insert(0, stored);
            })?;
        Ok(Some(note))
    }

    /// Notes for a video, newest first
    pub fn list(&self, video_id: &str) -> Vec<Note> {
        self.store.get_or_default(&notes_key(video_id))
    }

    /// Delete the single note whose id starts with `id_prefix`.
    ///
    /// Returns the removed note, or `None` when nothing (or more than one note) matches.
    pub fn delete(&self, video_id: &str, id_prefix: &str) -> Result<Option<Note>, StoreError> {
        let id_prefix = id_prefix.trim().to_lowercase();
        if id_prefix.is_empty() {
            return Ok(None);
        }

        let key = notes_key(video_id);
        let removed = self.store.update(&key, |notes: &mut Vec<Note>| {
            let matches: Vec<usize> = notes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.id.to_string().starts_with(&id_prefix))
                .map(|(i, _)| i)
                .collect();
            match matches.as_slice() {
                [index] => Some(notes.remove(*index)),
                _ => None,
            }
        })?;

        if self.list(video_id).is_empty() {
            self.store.remove(&key)?;
        }
        Ok(removed)
    }

    /// Ids of videos that have at least one note
    pub fn videos_with_notes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .keys_with_prefix(NOTES_PREFIX)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(NOTES_PREFIX).map(|s| s.to_string()))
            .collect())
    }

    /// Markdown export, oldest note first so it reads in video order.
    pub fn export_markdown(&self, video_id: &str, title: Option<&str>) -> String {
        let mut notes = self.list(video_id);
        notes.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut md = String::new();
        md.push_str("# ");
        md.push_str(title.unwrap_or(video_id));
        md.push_str("\n\n");
        md.push_str(&format!("https://www.youtube.com/watch?v={}\n\n", video_id));

        if notes.is_empty() {
            md.push_str("_No notes yet._\n");
            return md;
        }

        for note in notes {
            md.push_str(&format!(
                "- [{}](https://www.youtube.com/watch?v={}&t={}s) {}\n",
                note.formatted_time(),
                video_id,
                note.timestamp.floor() as u64,
                note.text
            ));
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, NotesStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(KvStore::open(temp_dir.path()).unwrap());
        (temp_dir, NotesStore::new(store))
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(75.9), "00:01:15");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
        assert_eq!(format_timestamp(-3.0), "00:00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_add_newest_first() {
        let (_temp_dir, notes) = setup();
        notes.add("vid", "first", 10.0).unwrap();
        notes.add("vid", "second", 5.0).unwrap();

        let listed = notes.list("vid");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].text, "second");
        assert_eq!(listed[1].text, "first");
    }

    #[test]
    fn test_blank_note_rejected() {
        let (_temp_dir, notes) = setup();
        assert!(notes.add("vid", "   \n", 3.0).unwrap().is_none());
        assert!(notes.list("vid").is_empty());
    }

    #[test]
    fn test_notes_scoped_per_video() {
        let (_temp_dir, notes) = setup();
        notes.add("a", "for a", 1.0).unwrap();
        notes.add("b", "for b", 1.0).unwrap();
        assert_eq!(notes.list("a").len(), 1);
        assert_eq!(notes.list("b")[0].text, "for b");
        assert_eq!(
            notes.videos_with_notes().unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_delete_by_prefix() {
        let (_temp_dir, notes) = setup();
        let keep = notes.add("vid", "keep", 1.0).unwrap().unwrap();
        let gone = notes.add("vid", "gone", 2.0).unwrap().unwrap();

        let removed = notes.delete("vid", &gone.short_id()).unwrap();
        assert_eq!(removed.map(|n| n.id), Some(gone.id));

        let listed = notes.list("vid");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);

        assert!(notes.delete("vid", "zzzz").unwrap().is_none());
    }

    #[test]
    fn test_deleting_last_note_drops_key() {
        let (_temp_dir, notes) = setup();
        let note = notes.add("vid", "only", 1.0).unwrap().unwrap();
        notes.delete("vid", &note.id.to_string()).unwrap();
        assert!(notes.videos_with_notes().unwrap().is_empty());
    }

    #[test]
    fn test_export_in_video_order() {
        let (_temp_dir, notes) = setup();
        notes.add("vid", "later point", 125.0).unwrap();
        notes.add("vid", "early point", 5.0).unwrap();

        let md = notes.export_markdown("vid", Some("Kinematics"));
        assert!(md.starts_with("# Kinematics\n"));
        let early = md.find("early point").unwrap();
        let later = md.find("later point").unwrap();
        assert!(early < later);
        assert!(md.contains("[00:02:05](https://www.youtube.com/watch?v=vid&t=125s)"));
    }
}
