//! JSON backup export and import.
//!
//! A backup is a pretty-printed JSON array of entries in the journal's
//! camelCase record format. Importing merges by id: a record replaces the
//! stored entry only when its `lastModified` is strictly newer.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::entry::{Entry, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::journal::Journal;
use crate::sharing;

/// Default backup file name for `date`, e.g. `journal-backup-2024-05-01.json`.
#[must_use]
pub fn default_file_name(date: NaiveDate) -> String {
    format!("journal-backup-{}.json", date.format(DATE_FORMAT))
}

/// Write `entries` as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_entries(entries: &[Entry], writer: impl Write) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read a backup, recomputing content hashes and normalizing collaborators.
///
/// Collaborator emails are lowercased and deduplicated in order.
///
/// # Errors
///
/// Returns [`Error::Json`] for malformed input and [`Error::CorruptRecord`]
/// if an id appears twice or a collaborator email is invalid.
pub fn read_entries(reader: impl Read) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = serde_json::from_reader(BufReader::new(reader))?;
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &mut entries {
        if !seen.insert(entry.id) {
            return Err(Error::corrupt_record(
                entry.id.to_string(),
                "id appears more than once in backup",
            ));
        }
        entry.shared_with = normalize_collaborators(entry)?;
        entry.rehash();
    }
    Ok(entries)
}

fn normalize_collaborators(entry: &Entry) -> Result<Vec<String>> {
    let mut emails: Vec<String> = Vec::with_capacity(entry.shared_with.len());
    for raw in &entry.shared_with {
        let email = sharing::normalize_email(raw).map_err(|_| {
            Error::corrupt_record(
                entry.id.to_string(),
                format!("invalid collaborator email '{raw}'"),
            )
        })?;
        if !emails.contains(&email) {
            emails.push(email);
        }
    }
    Ok(emails)
}

/// Export every entry to `dir`, named after `date`. Returns the file path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn export_to_dir(journal: &Journal, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let path = dir.join(default_file_name(date));
    export_to_file(journal, &path)?;
    Ok(path)
}

/// Export every entry to `path`. Returns how many were written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn export_to_file(journal: &Journal, path: &Path) -> Result<usize> {
    let entries = journal.export_entries()?;
    write_entries(&entries, File::create(path)?)?;
    info!("Exported {} entries to {}", entries.len(), path.display());
    Ok(entries.len())
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Records with ids not yet stored.
    pub inserted: usize,
    /// Stored entries overwritten by a newer record.
    pub replaced: usize,
    /// Records ignored because the stored entry was as new or newer.
    pub kept: usize,
}

impl ImportReport {
    /// Total records examined.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted + self.replaced + self.kept
    }
}

/// Merge `entries` into the journal in one transaction.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is applied in that case.
pub fn import_entries(journal: &Journal, entries: &[Entry]) -> Result<ImportReport> {
    let report = journal.storage().in_transaction(|storage| {
        let mut report = ImportReport::default();
        for incoming in entries {
            match storage.get_entry(incoming.id)? {
                None => {
                    storage.insert_entry(incoming)?;
                    report.inserted += 1;
                }
                Some(existing) if incoming.last_modified > existing.last_modified => {
                    storage.update_entry(incoming)?;
                    report.replaced += 1;
                }
                Some(_) => {
                    debug!("Keeping stored entry {}", incoming.id);
                    report.kept += 1;
                }
            }
        }
        Ok(report)
    })?;

    info!(
        "Imported backup: {} inserted, {} replaced, {} kept",
        report.inserted, report.replaced, report.kept
    );
    Ok(report)
}

/// Read a backup file and merge it into the journal.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a write fails.
pub fn import_from_file(journal: &Journal, path: &Path) -> Result<ImportReport> {
    let entries = read_entries(File::open(path)?)?;
    import_entries(journal, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{parse_date, EntryPatch, Mood, NewEntry};
    use chrono::Duration;
    use std::env;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("soulscripts_backup_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(
            default_file_name(day("2024-05-01")),
            "journal-backup-2024-05-01.json"
        );
    }

    #[test]
    fn test_write_is_pretty_array() {
        let journal = Journal::open_in_memory().unwrap();
        journal
            .add_entry(NewEntry::new(day("2024-05-01"), "hello").with_mood(Mood::new("😌", "Calm")))
            .unwrap();

        let mut buf = Vec::new();
        write_entries(&journal.export_entries().unwrap(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"lastModified\""));
        assert!(text.contains("\"emoji\": \"😌\""));
    }

    #[test]
    fn test_read_rejects_duplicate_ids() {
        let journal = Journal::open_in_memory().unwrap();
        journal.add_entry(NewEntry::new(day("2024-05-01"), "x")).unwrap();
        let mut entries = journal.export_entries().unwrap();
        entries.push(entries[0].clone());

        let mut buf = Vec::new();
        write_entries(&entries, &mut buf).unwrap();
        assert!(matches!(
            read_entries(buf.as_slice()),
            Err(Error::CorruptRecord { .. })
        ));
    }

    fn backup_with_collaborators(emails: &[&str]) -> String {
        let list = emails
            .iter()
            .map(|e| format!("\"{e}\""))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            r#"[{{
                "id": "6f1c2d9e-7b0a-4c55-9e2f-0d1b3a4c5e6f",
                "date": "2024-03-01",
                "content": "hello",
                "lastModified": 1709290000000,
                "shared": true,
                "sharedWith": [{list}]
            }}]"#
        )
    }

    #[test]
    fn test_read_normalizes_collaborators() {
        let json = backup_with_collaborators(&["Friend@Example.com", "friend@example.com", "b@example.org"]);
        let entries = read_entries(json.as_bytes()).unwrap();
        assert_eq!(
            entries[0].shared_with,
            vec!["friend@example.com", "b@example.org"]
        );
    }

    #[test]
    fn test_read_rejects_invalid_collaborator() {
        let json = backup_with_collaborators(&["friend@example.com", "not-an-email"]);
        assert!(matches!(
            read_entries(json.as_bytes()),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_imported_collaborator_can_be_removed() {
        let json = backup_with_collaborators(&["Friend@Example.com", "friend@example.com"]);
        let entries = read_entries(json.as_bytes()).unwrap();
        let journal = Journal::open_in_memory().unwrap();
        import_entries(&journal, &entries).unwrap();

        let entry = journal
            .unshare_entry(entries[0].id, "friend@example.com")
            .unwrap()
            .unwrap();
        assert!(entry.shared_with.is_empty());
        assert!(!entry.shared);
    }

    #[test]
    fn test_read_rejects_malformed_json() {
        assert!(matches!(
            read_entries("{ not json".as_bytes()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_import_into_empty_journal() {
        let source = Journal::open_in_memory().unwrap();
        let id = source.add_entry(NewEntry::new(day("2024-05-01"), "a")).unwrap();
        source.share_entry(id, "friend@example.com").unwrap();

        let mut buf = Vec::new();
        write_entries(&source.export_entries().unwrap(), &mut buf).unwrap();
        let entries = read_entries(buf.as_slice()).unwrap();

        let target = Journal::open_in_memory().unwrap();
        let report = import_entries(&target, &entries).unwrap();
        assert_eq!(report, ImportReport { inserted: 1, replaced: 0, kept: 0 });

        let restored = target.entry_by_id(id).unwrap().unwrap();
        assert_eq!(restored, source.entry_by_id(id).unwrap().unwrap());
    }

    #[test]
    fn test_import_latest_wins() {
        let journal = Journal::open_in_memory().unwrap();
        let newer_here = journal.add_entry(NewEntry::new(day("2024-05-01"), "local")).unwrap();
        let older_here = journal.add_entry(NewEntry::new(day("2024-05-02"), "local")).unwrap();

        let mut stale = journal.entry_by_id(newer_here).unwrap().unwrap();
        stale.set_content("from backup".to_string());
        stale.last_modified -= Duration::seconds(60);

        let mut fresh = journal.entry_by_id(older_here).unwrap().unwrap();
        fresh.set_content("from backup".to_string());
        fresh.last_modified += Duration::seconds(60);

        let report = import_entries(&journal, &[stale, fresh]).unwrap();
        assert_eq!(report, ImportReport { inserted: 0, replaced: 1, kept: 1 });
        assert_eq!(report.total(), 2);

        assert_eq!(journal.entry_by_id(newer_here).unwrap().unwrap().content, "local");
        assert_eq!(
            journal.entry_by_id(older_here).unwrap().unwrap().content,
            "from backup"
        );
    }

    #[test]
    fn test_import_equal_timestamp_keeps_stored() {
        let journal = Journal::open_in_memory().unwrap();
        let id = journal.add_entry(NewEntry::new(day("2024-05-01"), "local")).unwrap();
        let mut same_time = journal.entry_by_id(id).unwrap().unwrap();
        same_time.set_content("other".to_string());

        let report = import_entries(&journal, &[same_time]).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(journal.entry_by_id(id).unwrap().unwrap().content, "local");
    }

    #[test]
    fn test_export_and_import_files() {
        let dir = temp_dir("roundtrip");
        let journal = Journal::open_in_memory().unwrap();
        let id = journal.add_entry(NewEntry::new(day("2024-05-01"), "keep me")).unwrap();

        let path = export_to_dir(&journal, &dir, day("2024-06-01")).unwrap();
        assert_eq!(path, dir.join("journal-backup-2024-06-01.json"));

        journal
            .update_entry(id, "edited after backup", EntryPatch::default())
            .unwrap();
        journal.clear_all_entries().unwrap();

        let report = import_from_file(&journal, &path).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(journal.entry_by_id(id).unwrap().unwrap().content, "keep me");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
