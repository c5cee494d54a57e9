//! Storage layer for soulscripts.
//!
//! This module provides `SQLite`-based persistent storage for journal entries,
//! plus a small JSON key-value table used for application state such as
//! sound preferences and the working-offline flag.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entry::{Entry, Mood, DATE_FORMAT};
use crate::error::{Error, Result};

use schema::ENTRY_COLUMNS;

/// Storage engine for journal entries.
///
/// Entries are returned newest-first wherever recency matters. Ties on
/// `last_modified` are broken by insertion order, earliest first.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        info!("Journal opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside a transaction, committing only if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a database error if the transaction fails.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when an
    /// entry with the same id already exists.
    pub fn insert_entry(&self, entry: &Entry) -> Result<()> {
        let shared_with = serde_json::to_string(&entry.shared_with)?;
        let (mood_emoji, mood_label) = split_mood(entry.mood.as_ref());

        self.conn.execute(
            r"
            INSERT INTO entries (id, date, content, content_hash, last_modified, shared,
                                 shared_with, mood_emoji, mood_label, title, share_token)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                entry.id.to_string(),
                entry.date.format(DATE_FORMAT).to_string(),
                entry.content,
                entry.content_hash,
                entry.last_modified.timestamp_millis(),
                entry.shared,
                shared_with,
                mood_emoji,
                mood_label,
                entry.title,
                entry.share_token.map(|t| t.to_string()),
            ],
        )?;

        debug!("Inserted entry {} for {}", entry.id, entry.date);
        Ok(())
    }

    /// Overwrite every stored field of an existing entry.
    ///
    /// Returns `true` if a row was updated, `false` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_entry(&self, entry: &Entry) -> Result<bool> {
        let shared_with = serde_json::to_string(&entry.shared_with)?;
        let (mood_emoji, mood_label) = split_mood(entry.mood.as_ref());

        let affected = self.conn.execute(
            r"
            UPDATE entries SET date = ?2, content = ?3, content_hash = ?4, last_modified = ?5,
                               shared = ?6, shared_with = ?7, mood_emoji = ?8, mood_label = ?9,
                               title = ?10, share_token = ?11
            WHERE id = ?1
            ",
            params![
                entry.id.to_string(),
                entry.date.format(DATE_FORMAT).to_string(),
                entry.content,
                entry.content_hash,
                entry.last_modified.timestamp_millis(),
                entry.shared,
                shared_with,
                mood_emoji,
                mood_label,
                entry.title,
                entry.share_token.map(|t| t.to_string()),
            ],
        )?;

        Ok(affected > 0)
    }

    /// Get an entry by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_entry(&self, id: Uuid) -> Result<Option<Entry>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                [id.to_string()],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    /// Get an entry by its share token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_entry_by_token(&self, token: Uuid) -> Result<Option<Entry>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE share_token = ?1"),
                [token.to_string()],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    /// Get the stored content hash of an entry without loading its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn content_hash(&self, id: Uuid) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row(
                "SELECT content_hash FROM entries WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Get all entries for a date, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE date = ?1 \
             ORDER BY last_modified DESC, seq ASC"
        ))?;

        let entries = stmt
            .query_map([date.format(DATE_FORMAT).to_string()], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Get the most recently modified entry for a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn latest_for_date(&self, date: NaiveDate) -> Result<Option<Entry>> {
        let result = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE date = ?1 \
                     ORDER BY last_modified DESC, seq ASC LIMIT 1"
                ),
                [date.format(DATE_FORMAT).to_string()],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    /// Get every entry in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY seq ASC"))?;

        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Get the distinct dates holding at least one entry, within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn dates_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT DISTINCT date FROM entries WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            ",
        )?;

        let dates = stmt
            .query_map(
                params![
                    from.format(DATE_FORMAT).to_string(),
                    to.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let raw: String = row.get(0)?;
                    parse_column(0, &raw, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(dates)
    }

    /// Search entries by content or title.
    ///
    /// Performs a case-insensitive substring search, newest first. The query
    /// is matched literally; case folding is Unicode-aware.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Entry>> {
        let needle = query.to_lowercase();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries \
             WHERE instr({LOWER_FN}(content), ?1) > 0 \
                OR instr({LOWER_FN}(IFNULL(title, '')), ?1) > 0 \
             ORDER BY last_modified DESC, seq ASC LIMIT ?2"
        ))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(params![needle, limit_i64], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Count total entries in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete an entry by id.
    ///
    /// Returns `true` if an entry was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_entry(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?1", [id.to_string()])?;
        Ok(affected > 0)
    }

    /// Delete every entry.
    ///
    /// Returns the number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_entries(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM entries", [])?;
        if affected > 0 {
            info!("Cleared {} journal entries", affected);
        }
        Ok(affected)
    }

    /// Read a JSON value from the key-value table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored value does not
    /// deserialize into `T`.
    pub fn kv_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|s| serde_json::from_str(&s).map_err(Error::from))
            .transpose()
    }

    /// Write a JSON value to the key-value table, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn kv_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, raw],
        )?;
        debug!("Stored key {}", key);
        Ok(())
    }

    /// Remove a key from the key-value table.
    ///
    /// Returns `true` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn kv_remove(&self, key: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_entries = self.count()?;

        let shared_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM entries WHERE shared = 1", [], |row| {
                    row.get(0)
                })?;

        let (oldest, newest): (Option<String>, Option<String>) =
            self.conn
                .query_row("SELECT MIN(date), MAX(date) FROM entries", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;

        let oldest_date = oldest.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok());
        let newest_date = newest.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok());

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_entries,
            shared_entries,
            oldest_date,
            newest_date,
            db_size_bytes,
        })
    }

    /// Convert a database row to an Entry.
    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let id_str: String = row.get(0)?;
        let date_str: String = row.get(1)?;
        let content: String = row.get(2)?;
        let content_hash: String = row.get(3)?;
        let last_modified_ms: i64 = row.get(4)?;
        let shared: bool = row.get(5)?;
        let shared_with_json: String = row.get(6)?;
        let mood_emoji: Option<String> = row.get(7)?;
        let mood_label: Option<String> = row.get(8)?;
        let title: Option<String> = row.get(9)?;
        let share_token_str: Option<String> = row.get(10)?;

        let id = parse_column(0, &id_str, Uuid::parse_str)?;
        let date = parse_column(1, &date_str, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?;
        let last_modified = millis_to_datetime(4, last_modified_ms)?;
        let shared_with = parse_column(6, &shared_with_json, |s| {
            serde_json::from_str::<Vec<String>>(s)
        })?;
        let share_token = share_token_str
            .map(|s| parse_column(10, &s, Uuid::parse_str))
            .transpose()?;

        let mood = match (mood_emoji, mood_label) {
            (Some(emoji), Some(label)) => Some(Mood { emoji, label }),
            _ => None,
        };

        Ok(Entry {
            id,
            date,
            content,
            content_hash,
            last_modified,
            shared,
            shared_with,
            mood,
            title,
            share_token,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of entries stored.
    pub total_entries: i64,
    /// Number of entries with the public link enabled.
    pub shared_entries: i64,
    /// Earliest entry date.
    pub oldest_date: Option<NaiveDate>,
    /// Latest entry date.
    pub newest_date: Option<NaiveDate>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Name of the Unicode-aware lowercasing SQL function.
const LOWER_FN: &str = "unicode_lower";

/// Register the SQL functions the queries rely on.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: String = ctx.get(0)?;
            Ok(text.to_lowercase())
        },
    )?;
    Ok(())
}

fn split_mood(mood: Option<&Mood>) -> (Option<&str>, Option<&str>) {
    match mood {
        Some(m) => (Some(m.emoji.as_str()), Some(m.label.as_str())),
        None => (None, None),
    }
}

fn parse_column<T, E>(
    idx: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> std::result::Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parse(raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {ms}").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::NewEntry;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn create_test_entry(date: &str, content: &str) -> Entry {
        Entry::from_draft(NewEntry::new(day(date), content), Utc::now())
    }

    fn entry_at(date: &str, content: &str, ms: i64) -> Entry {
        let mut entry = create_test_entry(date, content);
        entry.last_modified = Utc.timestamp_millis_opt(ms).unwrap();
        entry
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let mut entry = create_test_entry("2024-03-01", "Hello, journal!");
        entry.mood = Some(Mood::new("😌", "Calm"));
        entry.title = Some("First".to_string());

        storage.insert_entry(&entry).unwrap();
        let retrieved = storage.get_entry(entry.id).unwrap().unwrap();

        assert_eq!(retrieved.content, "Hello, journal!");
        assert_eq!(retrieved.mood, Some(Mood::new("😌", "Calm")));
        assert_eq!(retrieved.title.as_deref(), Some("First"));
        assert_eq!(
            retrieved.last_modified.timestamp_millis(),
            entry.last_modified.timestamp_millis()
        );
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "x");
        storage.insert_entry(&entry).unwrap();
        assert!(storage.insert_entry(&entry).is_err());
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_entry(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_update_entry_roundtrips_sharing() {
        let storage = create_test_storage();
        let mut entry = create_test_entry("2024-03-01", "x");
        storage.insert_entry(&entry).unwrap();

        let token = Uuid::new_v4();
        entry.shared = true;
        entry.shared_with = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        entry.share_token = Some(token);
        assert!(storage.update_entry(&entry).unwrap());

        let retrieved = storage.get_entry(entry.id).unwrap().unwrap();
        assert!(retrieved.shared);
        assert_eq!(retrieved.shared_with, entry.shared_with);
        assert_eq!(retrieved.share_token, Some(token));

        let by_token = storage.get_entry_by_token(token).unwrap().unwrap();
        assert_eq!(by_token.id, entry.id);
    }

    #[test]
    fn test_update_unknown_entry() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "x");
        assert!(!storage.update_entry(&entry).unwrap());
    }

    #[test]
    fn test_entries_for_date_newest_first() {
        let storage = create_test_storage();
        let a = entry_at("2024-03-01", "a", 1_000);
        let b = entry_at("2024-03-01", "b", 3_000);
        let c = entry_at("2024-03-01", "c", 2_000);
        let other = entry_at("2024-03-02", "other", 9_000);
        for e in [&a, &b, &c, &other] {
            storage.insert_entry(e).unwrap();
        }

        let contents: Vec<_> = storage
            .entries_for_date(day("2024-03-01"))
            .unwrap()
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(contents, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_latest_for_date_tie_prefers_first_inserted() {
        let storage = create_test_storage();
        let first = entry_at("2024-03-01", "first", 5_000);
        let second = entry_at("2024-03-01", "second", 5_000);
        storage.insert_entry(&first).unwrap();
        storage.insert_entry(&second).unwrap();

        let latest = storage.latest_for_date(day("2024-03-01")).unwrap().unwrap();
        assert_eq!(latest.id, first.id);
    }

    #[test]
    fn test_latest_for_empty_date() {
        let storage = create_test_storage();
        assert!(storage
            .latest_for_date(day("2024-03-01"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_all_entries_in_insertion_order() {
        let storage = create_test_storage();
        let a = entry_at("2024-03-05", "a", 9_000);
        let b = entry_at("2024-03-01", "b", 1_000);
        storage.insert_entry(&a).unwrap();
        storage.insert_entry(&b).unwrap();

        let ids: Vec<_> = storage.all_entries().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_dates_between() {
        let storage = create_test_storage();
        for (date, content) in [
            ("2024-02-28", "before"),
            ("2024-03-01", "one"),
            ("2024-03-01", "two"),
            ("2024-03-15", "mid"),
            ("2024-04-01", "after"),
        ] {
            storage
                .insert_entry(&create_test_entry(date, content))
                .unwrap();
        }

        let dates = storage
            .dates_between(day("2024-03-01"), day("2024-03-31"))
            .unwrap();
        assert_eq!(dates, vec![day("2024-03-01"), day("2024-03-15")]);
    }

    #[test]
    fn test_search() {
        let storage = create_test_storage();
        storage
            .insert_entry(&create_test_entry("2024-03-01", "Walked in the rain"))
            .unwrap();
        storage
            .insert_entry(&create_test_entry("2024-03-02", "Sunny afternoon"))
            .unwrap();
        let mut titled = create_test_entry("2024-03-03", "nothing here");
        titled.title = Some("Rainy thoughts".to_string());
        storage.insert_entry(&titled).unwrap();

        assert_eq!(storage.search("rain", 10).unwrap().len(), 2);
        assert_eq!(storage.search("SUNNY", 10).unwrap().len(), 1);
        assert_eq!(storage.search("snow", 10).unwrap().len(), 0);
        assert_eq!(storage.search("", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let storage = create_test_storage();
        for (date, content) in [
            ("2024-03-01", "saved 100% of my energy"),
            ("2024-03-02", "nothing special"),
            ("2024-03-03", "snake_case thoughts"),
        ] {
            storage
                .insert_entry(&create_test_entry(date, content))
                .unwrap();
        }

        let hits = storage.search("%", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "saved 100% of my energy");

        let hits = storage.search("_", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "snake_case thoughts");

        assert!(storage.search("100\\%", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let storage = create_test_storage();
        storage
            .insert_entry(&create_test_entry("2024-07-14", "Été à Paris"))
            .unwrap();

        assert_eq!(storage.search("été", 10).unwrap().len(), 1);
        assert_eq!(storage.search("ÉTÉ À", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_content_hash() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "abc");
        storage.insert_entry(&entry).unwrap();

        assert_eq!(
            storage.content_hash(entry.id).unwrap(),
            Some(Entry::compute_hash("abc"))
        );
        assert!(storage.content_hash(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "To delete");
        storage.insert_entry(&entry).unwrap();

        assert!(storage.delete_entry(entry.id).unwrap());
        assert!(storage.get_entry(entry.id).unwrap().is_none());
        assert!(!storage.delete_entry(entry.id).unwrap());
    }

    #[test]
    fn test_clear_entries() {
        let storage = create_test_storage();
        storage
            .insert_entry(&create_test_entry("2024-03-01", "a"))
            .unwrap();
        storage
            .insert_entry(&create_test_entry("2024-03-02", "b"))
            .unwrap();

        assert_eq!(storage.clear_entries().unwrap(), 2);
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_kv_roundtrip() {
        let storage = create_test_storage();
        assert_eq!(storage.kv_get::<f32>("volume").unwrap(), None);

        storage.kv_set("volume", &0.25_f32).unwrap();
        assert_eq!(storage.kv_get::<f32>("volume").unwrap(), Some(0.25));

        storage.kv_set("volume", &0.75_f32).unwrap();
        assert_eq!(storage.kv_get::<f32>("volume").unwrap(), Some(0.75));

        assert!(storage.kv_remove("volume").unwrap());
        assert!(!storage.kv_remove("volume").unwrap());
        assert_eq!(storage.kv_get::<f32>("volume").unwrap(), None);
    }

    #[test]
    fn test_kv_type_mismatch_is_error() {
        let storage = create_test_storage();
        storage.kv_set("flag", "not a bool").unwrap();
        assert!(matches!(
            storage.kv_get::<bool>("flag"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_in_transaction_rolls_back_on_error() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "x");

        let result: Result<()> = storage.in_transaction(|s| {
            s.insert_entry(&entry)?;
            Err(Error::internal("abort"))
        });

        assert!(result.is_err());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_in_transaction_commits() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "x");

        storage.in_transaction(|s| s.insert_entry(&entry)).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_entries, 0);
        assert!(stats.oldest_date.is_none());
        assert!(stats.newest_date.is_none());
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage
            .insert_entry(&create_test_entry("2024-01-10", "First"))
            .unwrap();
        let mut shared = create_test_entry("2024-05-02", "Second");
        shared.shared = true;
        storage.insert_entry(&shared).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.shared_entries, 1);
        assert_eq!(stats.oldest_date, Some(day("2024-01-10")));
        assert_eq!(stats.newest_date, Some(day("2024-05-02")));
    }

    #[test]
    fn test_unicode_content() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "Hello 世界 🌍 مرحبا");
        storage.insert_entry(&entry).unwrap();

        let retrieved = storage.get_entry(entry.id).unwrap().unwrap();
        assert_eq!(retrieved.content, "Hello 世界 🌍 مرحبا");
    }

    #[test]
    fn test_corrupt_date_is_reported() {
        let storage = create_test_storage();
        let entry = create_test_entry("2024-03-01", "x");
        storage.insert_entry(&entry).unwrap();
        storage
            .conn
            .execute("UPDATE entries SET date = 'someday'", [])
            .unwrap();

        assert!(matches!(
            storage.get_entry(entry.id),
            Err(Error::DatabaseQuery(_))
        ));
    }

    #[test]
    fn test_open_file_based() {
        let temp_dir = std::env::temp_dir();
        let db_path = temp_dir.join(format!("soulscripts_test_{}.db", std::process::id()));

        let entry = create_test_entry("2024-03-01", "persisted");
        {
            let storage = Storage::open(&db_path).unwrap();
            storage.insert_entry(&entry).unwrap();
            assert_eq!(storage.path(), db_path);
        }

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(
            reopened.get_entry(entry.id).unwrap().unwrap().content,
            "persisted"
        );
        assert!(reopened.stats().unwrap().db_size_bytes > 0);

        drop(reopened);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = std::env::temp_dir();
        let nested_path = temp_dir.join(format!(
            "soulscripts_test_{}/nested/journal.db",
            std::process::id()
        ));

        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent.parent().unwrap());
        }
    }

    #[test]
    fn test_millis_to_datetime() {
        let dt = millis_to_datetime(0, 1_709_290_000_123).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_709_290_000_123);
        assert!(millis_to_datetime(0, i64::MAX).is_err());
    }
}
