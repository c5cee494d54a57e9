//! Core entry types for soulscripts.
//!
//! This module defines the journal entry record, the mood tag attached to it,
//! and the drafts and patches used to create and edit entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Date format used for entry keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Title shown for entries that were never named.
pub const UNTITLED: &str = "Untitled";

/// Moods offered by the editor palette, as `(emoji, label)` pairs.
pub const PRESET_MOODS: &[(&str, &str)] = &[
    ("😊", "Happy"),
    ("😔", "Sad"),
    ("😌", "Calm"),
    ("😤", "Frustrated"),
    ("😰", "Anxious"),
    ("🥰", "Loved"),
];

/// A mood tag attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mood {
    /// Emoji shown for the mood.
    pub emoji: String,
    /// Human-readable label.
    pub label: String,
}

impl Mood {
    /// Create a mood from any emoji and label.
    #[must_use]
    pub fn new(emoji: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            label: label.into(),
        }
    }

    /// All preset moods in palette order.
    #[must_use]
    pub fn presets() -> Vec<Self> {
        PRESET_MOODS
            .iter()
            .map(|(emoji, label)| Self::new(*emoji, *label))
            .collect()
    }

    /// Look up a preset by label (case-insensitive) or by emoji.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMood`] if no preset matches.
    pub fn preset(name: &str) -> Result<Self> {
        let name = name.trim();
        PRESET_MOODS
            .iter()
            .find(|(emoji, label)| *emoji == name || label.eq_ignore_ascii_case(name))
            .map(|(emoji, label)| Self::new(*emoji, *label))
            .ok_or_else(|| Error::UnknownMood {
                name: name.to_string(),
            })
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.emoji, self.label)
    }
}

/// A journal entry.
///
/// Entries are keyed by calendar date; a day may hold any number of them.
/// Serialized field names match the journal backup format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier.
    pub id: Uuid,

    /// Calendar day this entry belongs to.
    pub date: NaiveDate,

    /// Text body.
    pub content: String,

    /// BLAKE3 hash of the content, recomputed on load.
    #[serde(skip)]
    pub content_hash: String,

    /// Last modification time, millisecond precision.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,

    /// Whether the public link is enabled.
    pub shared: bool,

    /// Collaborator emails, in the order they were added.
    #[serde(default)]
    pub shared_with: Vec<String>,

    /// Optional mood tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,

    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Token for the public view link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<Uuid>,
}

impl Entry {
    /// Build a fresh, unshared entry from a draft.
    #[must_use]
    pub fn from_draft(draft: NewEntry, last_modified: DateTime<Utc>) -> Self {
        let content_hash = Self::compute_hash(&draft.content);
        Self {
            id: Uuid::new_v4(),
            date: draft.date,
            content: draft.content,
            content_hash,
            last_modified,
            shared: false,
            shared_with: Vec::new(),
            mood: draft.mood,
            title: draft.title,
            share_token: None,
        }
    }

    /// Compute the BLAKE3 hash of the given content.
    #[must_use]
    pub fn compute_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Replace the content and refresh its hash.
    pub fn set_content(&mut self, content: String) {
        self.content_hash = Self::compute_hash(&content);
        self.content = content;
    }

    /// Recompute the content hash, e.g. after deserializing a backup.
    pub fn rehash(&mut self) {
        self.content_hash = Self::compute_hash(&self.content);
    }

    /// Title for display: the trimmed title, or "Untitled".
    #[must_use]
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED,
        }
    }

    /// Tab label for the `index`-th entry of a day (zero-based).
    #[must_use]
    pub fn tab_label(&self, index: usize) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Script {}", index + 1),
        }
    }

    /// Whether the content is empty or only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether `email` is already a collaborator.
    #[must_use]
    pub fn is_shared_with(&self, email: &str) -> bool {
        self.shared_with.iter().any(|e| e == email)
    }
}

/// Draft used to create a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Calendar day.
    pub date: NaiveDate,
    /// Text body.
    pub content: String,
    /// Optional mood.
    pub mood: Option<Mood>,
    /// Optional title.
    pub title: Option<String>,
}

impl NewEntry {
    /// Draft an entry with only a date and content.
    #[must_use]
    pub fn new(date: NaiveDate, content: impl Into<String>) -> Self {
        Self {
            date,
            content: content.into(),
            mood: None,
            title: None,
        }
    }

    /// Attach a mood.
    #[must_use]
    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    /// Attach a title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Extra fields applied on top of a content update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    /// New title.
    pub title: Option<String>,
    /// New mood.
    pub mood: Option<Mood>,
    /// New public-link flag.
    pub shared: Option<bool>,
}

impl EntryPatch {
    /// Apply the patch to an entry.
    ///
    /// The title is trimmed; a blank title clears it.
    pub fn apply(self, entry: &mut Entry) {
        if let Some(title) = self.title {
            let title = title.trim();
            entry.title = (!title.is_empty()).then(|| title.to_string());
        }
        if let Some(mood) = self.mood {
            entry.mood = Some(mood);
        }
        if let Some(shared) = self.shared {
            entry.shared = shared;
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not a valid calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}

/// Format a date for headings, e.g. "October 18, 2026".
#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_mood_presets() {
        let presets = Mood::presets();
        assert_eq!(presets.len(), 6);
        assert_eq!(presets[0], Mood::new("😊", "Happy"));
    }

    #[test]
    fn test_mood_preset_lookup() {
        assert_eq!(Mood::preset("calm").unwrap().emoji, "😌");
        assert_eq!(Mood::preset("🥰").unwrap().label, "Loved");
        assert!(matches!(
            Mood::preset("ecstatic"),
            Err(Error::UnknownMood { .. })
        ));
    }

    #[test]
    fn test_mood_display() {
        assert_eq!(Mood::new("😔", "Sad").to_string(), "😔 Sad");
    }

    #[test]
    fn test_from_draft_resets_sharing() {
        let draft = NewEntry::new(day("2024-03-01"), "Morning pages").with_title("Day one");
        let entry = Entry::from_draft(draft, Utc::now());

        assert_eq!(entry.content, "Morning pages");
        assert_eq!(entry.title.as_deref(), Some("Day one"));
        assert!(!entry.shared);
        assert!(entry.shared_with.is_empty());
        assert!(entry.share_token.is_none());
        assert_eq!(entry.content_hash, Entry::compute_hash("Morning pages"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Entry::from_draft(NewEntry::new(day("2024-03-01"), ""), Utc::now());
        let b = Entry::from_draft(NewEntry::new(day("2024-03-01"), ""), Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_set_content_refreshes_hash() {
        let mut entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), "a"), Utc::now());
        entry.set_content("b".to_string());
        assert_eq!(entry.content_hash, Entry::compute_hash("b"));
    }

    #[test]
    fn test_display_title() {
        let mut entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), ""), Utc::now());
        assert_eq!(entry.display_title(), "Untitled");

        entry.title = Some("   ".to_string());
        assert_eq!(entry.display_title(), "Untitled");

        entry.title = Some("  Rainy day ".to_string());
        assert_eq!(entry.display_title(), "Rainy day");
    }

    #[test]
    fn test_tab_label() {
        let mut entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), ""), Utc::now());
        assert_eq!(entry.tab_label(1), "Script 2");
        entry.title = Some("Dreams".to_string());
        assert_eq!(entry.tab_label(1), "Dreams");
    }

    #[test]
    fn test_is_blank() {
        let entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), " \n\t"), Utc::now());
        assert!(entry.is_blank());
    }

    #[test]
    fn test_patch_apply() {
        let mut entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), "x"), Utc::now());
        EntryPatch {
            title: Some("New".to_string()),
            mood: Some(Mood::new("😌", "Calm")),
            shared: None,
        }
        .apply(&mut entry);

        assert_eq!(entry.title.as_deref(), Some("New"));
        assert_eq!(entry.mood, Some(Mood::new("😌", "Calm")));
        assert!(!entry.shared);
    }

    #[test]
    fn test_patch_trims_and_clears_title() {
        let mut entry = Entry::from_draft(
            NewEntry::new(day("2024-03-01"), "x").with_title("Old"),
            Utc::now(),
        );
        EntryPatch {
            title: Some("  Morning walk  ".to_string()),
            ..EntryPatch::default()
        }
        .apply(&mut entry);
        assert_eq!(entry.title.as_deref(), Some("Morning walk"));

        EntryPatch {
            title: Some("   ".to_string()),
            ..EntryPatch::default()
        }
        .apply(&mut entry);
        assert!(entry.title.is_none());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("03/01/2024").is_err());
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date(day("2026-10-08")), "October 8, 2026");
    }

    #[test]
    fn test_backup_field_names() {
        let mut entry = Entry::from_draft(NewEntry::new(day("2024-03-01"), "hi"), Utc::now());
        entry.share_token = Some(Uuid::new_v4());
        let json = serde_json::to_value(&entry).unwrap();

        assert!(json.get("lastModified").unwrap().is_i64());
        assert!(json.get("sharedWith").is_some());
        assert!(json.get("shareToken").is_some());
        assert!(json.get("contentHash").is_none());
        assert_eq!(json["date"], "2024-03-01");
    }

    #[test]
    fn test_deserialize_minimal_backup_record() {
        let json = r#"{
            "id": "6f1c2d9e-7b0a-4c55-9e2f-0d1b3a4c5e6f",
            "date": "2024-03-01",
            "content": "hello",
            "lastModified": 1709290000000,
            "shared": false
        }"#;
        let mut entry: Entry = serde_json::from_str(json).unwrap();
        entry.rehash();

        assert!(entry.shared_with.is_empty());
        assert!(entry.mood.is_none());
        assert_eq!(entry.last_modified.timestamp_millis(), 1_709_290_000_000);
        assert_eq!(entry.content_hash, Entry::compute_hash("hello"));
    }
}
