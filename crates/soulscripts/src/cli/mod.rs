//! Command-line interface for soulscripts.
//!
//! This module provides the CLI structure for the `soul` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::error::{Error, Result};

pub use commands::{
    ConfigCommand, ExportCommand, ListCommand, NetworkCommand, OutputFormat, SearchCommand,
    ShareCommand, ShowCommand, SoundCommand, StatsCommand, StatusCommand, WriteCommand,
};

/// soul - A quiet place to write
///
/// Keeps dated journal entries in a local database, with moods, titles,
/// sharing links, writing stats and an ambient sound picker.
#[derive(Debug, Parser)]
#[command(name = "soul")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write or replace an entry
    Write(WriteCommand),

    /// Show entries for a day
    Show(ShowCommand),

    /// List days with entries in a month
    List(ListCommand),

    /// Delete an entry
    Delete {
        /// Entry id
        id: Uuid,
    },

    /// Set an entry's mood
    Mood {
        /// Entry id
        id: Uuid,
        /// Mood label or emoji
        mood: String,
    },

    /// Set an entry's title (empty clears it)
    Title {
        /// Entry id
        id: Uuid,
        /// New title
        title: String,
    },

    /// Share entries with collaborators
    #[command(subcommand)]
    Share(ShareCommand),

    /// Open a shared entry by its link token
    View {
        /// Share token from the public link
        token: Uuid,
    },

    /// Search entries
    Search(SearchCommand),

    /// Show writing stats
    Stats(StatsCommand),

    /// Export all entries to a JSON backup
    Export(ExportCommand),

    /// Merge a JSON backup into the journal
    Import {
        /// Backup file
        file: PathBuf,
    },

    /// Delete every entry
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Control the ambient sound player
    #[command(subcommand)]
    Sound(SoundCommand),

    /// Show or change the network mode
    #[command(subcommand)]
    Network(NetworkCommand),

    /// Show journal status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

/// Parse a `YYYY-MM` month into `(year, month)`.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not a valid month.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let invalid = || Error::InvalidDate {
        input: input.to_string(),
    };
    let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}
