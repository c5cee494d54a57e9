//! Error types for soulscripts.
//!
//! This module defines all error types used throughout the soulscripts crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for soulscripts operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt record {id}: {message}")]
    CorruptRecord {
        /// Identifier of the offending row.
        id: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Entry Errors ===
    /// No entry exists with the given id.
    #[error("entry not found: {id}")]
    EntryNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A date string could not be parsed.
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// An unknown mood name was given.
    #[error("unknown mood: {name}")]
    UnknownMood {
        /// The rejected mood name.
        name: String,
    },

    // === Sharing Errors ===
    /// Collaborator email failed validation.
    #[error("invalid email: {email}")]
    InvalidEmail {
        /// The rejected email.
        email: String,
    },

    /// Sharing was attempted while offline.
    #[error("sharing is unavailable while offline")]
    SharingUnavailable,

    /// No publicly shared entry exists for a token.
    #[error("no shared entry for token {token}")]
    ShareTokenNotFound {
        /// The token that was looked up.
        token: String,
    },

    // === Audio Errors ===
    /// No sound in the catalog has the given id.
    #[error("unknown sound: {id}")]
    UnknownSound {
        /// The rejected sound id.
        id: String,
    },

    /// A volume value was not a number.
    #[error("invalid volume: {0}")]
    InvalidVolume(f32),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for soulscripts operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an entry-not-found error.
    #[must_use]
    pub fn entry_not_found(id: impl Into<String>) -> Self {
        Self::EntryNotFound { id: id.into() }
    }

    /// Create an invalid-email error.
    #[must_use]
    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    /// Create a corrupt-record error.
    #[must_use]
    pub fn corrupt_record(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Check if this error means a lookup found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EntryNotFound { .. } | Self::ShareTokenNotFound { .. } | Self::UnknownSound { .. }
        )
    }

    /// Check if this error is caused by bad user input.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate { .. }
                | Self::InvalidEmail { .. }
                | Self::UnknownMood { .. }
                | Self::InvalidVolume(_)
                | Self::ConfigValidation { .. }
        )
    }
}
