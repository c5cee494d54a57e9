//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use uuid::Uuid;

/// Write command arguments.
#[derive(Debug, Args)]
pub struct WriteCommand {
    /// Text to save; read from stdin when omitted
    pub content: Option<String>,

    /// Day the entry belongs to (YYYY-MM-DD, default today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Replace the content of this entry instead of creating one
    #[arg(long)]
    pub id: Option<Uuid>,

    /// Mood label or emoji (e.g. "calm")
    #[arg(short, long)]
    pub mood: Option<String>,

    /// Entry title
    #[arg(short, long)]
    pub title: Option<String>,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Day to show (YYYY-MM-DD, default today)
    pub date: Option<NaiveDate>,

    /// Show a single entry by id
    #[arg(long, conflicts_with = "date")]
    pub id: Option<Uuid>,

    /// Show every entry of the day, not just the latest
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Month to list (YYYY-MM, default current month)
    #[arg(short, long)]
    pub month: Option<String>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// The search query (searches content and titles)
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Compute as of this day (default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output file ("-" for stdout); defaults to a dated file in the backup dir
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Sharing commands.
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Share an entry with a collaborator
    Add {
        /// Entry id
        id: Uuid,
        /// Collaborator email
        email: String,
    },

    /// Stop sharing an entry with a collaborator
    Remove {
        /// Entry id
        id: Uuid,
        /// Collaborator email
        email: String,
    },

    /// Turn the public link on or off
    Toggle {
        /// Entry id
        id: Uuid,
    },

    /// Revoke the public link and all collaborators
    Revoke {
        /// Entry id
        id: Uuid,
    },

    /// Print the public link for an entry
    Link {
        /// Entry id
        id: Uuid,
    },

    /// List entries that can be shared
    List,
}

/// Ambient sound commands.
#[derive(Debug, Subcommand)]
pub enum SoundCommand {
    /// List available sounds
    List,

    /// Select a sound (selecting the current one toggles playback)
    Select {
        /// Sound id (e.g. "rain")
        id: String,
    },

    /// Toggle playback of the current sound
    Toggle,

    /// Set the volume (0.0 to 1.0)
    Volume {
        /// New volume
        value: f32,
    },

    /// Stop playback
    Stop,

    /// Show player state
    Status,
}

/// Network commands.
#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Show the connection mode
    Status,

    /// Toggle working offline
    Offline,

    /// Check connectivity now
    Probe,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
