//! `soulscripts` - A local-first journaling library
//!
//! This library provides the journal entry store (dated entries with moods,
//! titles and sharing metadata), offline-aware sharing, writing statistics,
//! JSON backups and the ambient sound player state, all persisted in SQLite.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod audio;
pub mod backup;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod journal;
pub mod logging;
pub mod network;
pub mod sharing;
pub mod stats;
pub mod storage;

pub use audio::{AudioState, Sound, SOUNDS};
pub use backup::ImportReport;
pub use config::Config;
pub use entry::{Entry, EntryPatch, Mood, NewEntry};
pub use error::{Error, Result};
pub use journal::{Journal, SaveOutcome};
pub use logging::init_logging;
pub use network::{ConnectionMode, ConnectivityProbe, NetworkStatus, TcpProbe};
pub use stats::WritingStats;
pub use storage::{Storage, StorageStats};
