//! The journal entry store.
//!
//! [`Journal`] owns the [`Storage`] handle and implements every entry
//! operation on top of it: creation, edits, mood and title changes, the
//! collaborator and public-link sharing model, export and wipe.
//!
//! Edits that touch the content, mood, title or collaborator list bump
//! `last_modified`; toggling or revoking the public link does not. When a
//! single entry is wanted for a date, the most recently modified one wins.

use std::cell::Cell;

use chrono::{DateTime, Months, NaiveDate, TimeZone, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::entry::{Entry, EntryPatch, Mood, NewEntry};
use crate::error::{Error, Result};
use crate::sharing;
use crate::storage::Storage;

/// Result of saving editor content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new entry was created.
    Created(Uuid),
    /// The active entry's content was replaced.
    Updated(Uuid),
    /// The content matched what was already stored.
    Unchanged(Uuid),
    /// Nothing to save: no active entry and blank content.
    Skipped,
}

impl SaveOutcome {
    /// The entry the editor should treat as active after this save.
    #[must_use]
    pub fn entry_id(&self) -> Option<Uuid> {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => Some(*id),
            Self::Skipped => None,
        }
    }
}

/// Entry store backed by SQLite.
#[derive(Debug)]
pub struct Journal {
    storage: Storage,
    /// Last timestamp handed out, in epoch milliseconds.
    last_stamp: Cell<i64>,
}

impl Journal {
    /// Wrap an open storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            last_stamp: Cell::new(0),
        }
    }

    /// Open the journal database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Storage::open(config.database_path())?))
    }

    /// Open a throwaway in-memory journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?))
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Current time, strictly later than any earlier stamp from this journal.
    fn stamp(&self) -> DateTime<Utc> {
        let next = Utc::now()
            .timestamp_millis()
            .max(self.last_stamp.get() + 1);
        self.last_stamp.set(next);
        Utc.timestamp_millis_opt(next).single().unwrap_or_else(Utc::now)
    }

    /// Load an entry, let `edit` change it, and write it back if `edit`
    /// reports a change. Unknown ids yield `None`.
    fn modify(&self, id: Uuid, edit: impl FnOnce(&mut Entry) -> bool) -> Result<Option<Entry>> {
        let Some(mut entry) = self.storage.get_entry(id)? else {
            debug!("No entry {} to modify", id);
            return Ok(None);
        };
        if edit(&mut entry) {
            self.storage.update_entry(&entry)?;
        }
        Ok(Some(entry))
    }

    /// Create an entry from a draft and return its id.
    ///
    /// The entry starts unshared with no collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    pub fn add_entry(&self, draft: NewEntry) -> Result<Uuid> {
        let entry = Entry::from_draft(draft, self.stamp());
        self.storage.insert_entry(&entry)?;
        debug!("Added entry {} for {}", entry.id, entry.date);
        Ok(entry.id)
    }

    /// Replace an entry's content, bump its modification time, then apply
    /// `patch`. Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_entry(
        &self,
        id: Uuid,
        content: impl Into<String>,
        patch: EntryPatch,
    ) -> Result<bool> {
        let content = content.into();
        let updated = self.modify(id, |entry| {
            entry.set_content(content);
            entry.last_modified = self.stamp();
            patch.apply(entry);
            true
        })?;
        Ok(updated.is_some())
    }

    /// The most recently modified entry for `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entry_by_date(&self, date: NaiveDate) -> Result<Option<Entry>> {
        self.storage.latest_for_date(date)
    }

    /// All entries for `date`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entries_by_date(&self, date: NaiveDate) -> Result<Vec<Entry>> {
        self.storage.entries_for_date(date)
    }

    /// Look up an entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entry_by_id(&self, id: Uuid) -> Result<Option<Entry>> {
        self.storage.get_entry(id)
    }

    /// Delete an entry. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_entry(&self, id: Uuid) -> Result<bool> {
        let deleted = self.storage.delete_entry(id)?;
        if deleted {
            debug!("Deleted entry {}", id);
        }
        Ok(deleted)
    }

    /// Set an entry's mood.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_mood(&self, id: Uuid, mood: Mood) -> Result<Option<Entry>> {
        self.modify(id, |entry| {
            entry.mood = Some(mood);
            entry.last_modified = self.stamp();
            true
        })
    }

    /// Set an entry's title. A blank title clears it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_title(&self, id: Uuid, title: &str) -> Result<Option<Entry>> {
        let title = title.trim();
        self.modify(id, |entry| {
            entry.title = (!title.is_empty()).then(|| title.to_string());
            entry.last_modified = self.stamp();
            true
        })
    }

    /// Add a collaborator.
    ///
    /// The email is validated and lowercased. Adding an existing collaborator
    /// changes nothing. Otherwise the email is appended, the public link is
    /// enabled, a share token is minted if the entry has none, and the entry
    /// is bumped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmail`] for a malformed email, or a database error.
    pub fn share_entry(&self, id: Uuid, email: &str) -> Result<Option<Entry>> {
        let email = sharing::normalize_email(email)?;
        self.modify(id, |entry| {
            if entry.is_shared_with(&email) {
                return false;
            }
            info!("Sharing entry {} with {}", entry.id, email);
            entry.shared_with.push(email);
            entry.shared = true;
            entry.share_token.get_or_insert_with(Uuid::new_v4);
            entry.last_modified = self.stamp();
            true
        })
    }

    /// Remove a collaborator.
    ///
    /// The public link stays enabled only while collaborators remain. The
    /// share token is kept. The entry is bumped even if the email was absent.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn unshare_entry(&self, id: Uuid, email: &str) -> Result<Option<Entry>> {
        let email = email.trim().to_lowercase();
        self.modify(id, |entry| {
            entry.shared_with.retain(|e| *e != email);
            entry.shared = !entry.shared_with.is_empty();
            entry.last_modified = self.stamp();
            true
        })
    }

    /// Flip the public-link flag, minting a token when enabling without one.
    ///
    /// Does not bump `last_modified`.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn toggle_share_status(&self, id: Uuid) -> Result<Option<Entry>> {
        self.modify(id, |entry| {
            entry.shared = !entry.shared;
            if entry.shared {
                entry.share_token.get_or_insert_with(Uuid::new_v4);
            }
            true
        })
    }

    /// Revoke all sharing: drop the token, disable the link, clear collaborators.
    ///
    /// Does not bump `last_modified`. Old links stop resolving.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn revoke_share_link(&self, id: Uuid) -> Result<Option<Entry>> {
        self.modify(id, |entry| {
            info!("Revoking share link for entry {}", entry.id);
            entry.share_token = None;
            entry.shared = false;
            entry.shared_with.clear();
            true
        })
    }

    /// Resolve a public link token to its entry.
    ///
    /// Only entries whose public link is enabled resolve.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShareTokenNotFound`] if no enabled entry carries the token.
    pub fn shared_entry(&self, token: Uuid) -> Result<Entry> {
        self.storage
            .get_entry_by_token(token)?
            .filter(|entry| entry.shared)
            .ok_or_else(|| Error::ShareTokenNotFound {
                token: token.to_string(),
            })
    }

    /// Entries worth offering in the share picker: those with non-blank content.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn shareable_entries(&self) -> Result<Vec<Entry>> {
        Ok(self
            .storage
            .all_entries()?
            .into_iter()
            .filter(|entry| !entry.is_blank())
            .collect())
    }

    /// Every entry, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn export_entries(&self) -> Result<Vec<Entry>> {
        self.storage.all_entries()
    }

    /// Delete every entry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn clear_all_entries(&self) -> Result<usize> {
        self.storage.clear_entries()
    }

    /// Save editor content for `date`.
    ///
    /// With an active entry, the content is written only if it differs from
    /// what is stored. Without one, a new entry is created unless the content
    /// is blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if `active` names a missing entry,
    /// or a database error.
    pub fn save_draft(
        &self,
        date: NaiveDate,
        active: Option<Uuid>,
        content: &str,
    ) -> Result<SaveOutcome> {
        match active {
            Some(id) => match self.storage.content_hash(id)? {
                None => Err(Error::entry_not_found(id.to_string())),
                Some(hash) if hash == Entry::compute_hash(content) => {
                    Ok(SaveOutcome::Unchanged(id))
                }
                Some(_) => {
                    self.update_entry(id, content, EntryPatch::default())?;
                    Ok(SaveOutcome::Updated(id))
                }
            },
            None if content.trim().is_empty() => Ok(SaveOutcome::Skipped),
            None => Ok(SaveOutcome::Created(
                self.add_entry(NewEntry::new(date, content))?,
            )),
        }
    }

    /// Dates within a calendar month that hold at least one entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDate`] for an impossible month, or a database error.
    pub fn dates_with_entries(&self, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
        let invalid = || Error::InvalidDate {
            input: format!("{year}-{month:02}"),
        };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        self.storage.dates_between(first, last)
    }

    /// Case-insensitive search over content and titles, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Entry>> {
        self.storage.search(query, limit)
    }
}
