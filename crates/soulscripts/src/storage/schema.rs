//! `SQLite` schema definitions for soulscripts.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the entries table.
///
/// `seq` preserves insertion order; `id` is the public identifier.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    date TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    last_modified INTEGER NOT NULL,
    shared INTEGER NOT NULL DEFAULT 0,
    shared_with TEXT NOT NULL DEFAULT '[]',
    mood_emoji TEXT,
    mood_label TEXT,
    title TEXT,
    share_token TEXT UNIQUE
)
";

/// SQL statement to create an index on date for per-day lookups.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date, last_modified DESC)
";

/// SQL statement to create an index on `last_modified` for recency queries.
pub const CREATE_MODIFIED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_modified ON entries(last_modified DESC)
";

/// SQL statement to create the metadata table for internal bookkeeping.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the application key-value table (schema v2).
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Column list shared by every entry query, in `row_to_entry` order.
pub const ENTRY_COLUMNS: &str = "id, date, content, content_hash, last_modified, shared, \
     shared_with, mood_emoji, mood_label, title, share_token";

/// Base schema statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ENTRIES_TABLE,
    CREATE_DATE_INDEX,
    CREATE_MODIFIED_INDEX,
    CREATE_METADATA_TABLE,
];
