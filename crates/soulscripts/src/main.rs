//! `soul` - CLI for soulscripts
//!
//! This binary provides the command-line interface for writing, sharing and
//! backing up journal entries, and for the ambient sound player.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use tracing::debug;

use soulscripts::audio::{self, AudioState};
use soulscripts::backup;
use soulscripts::cli::{
    parse_month, Cli, Command, ConfigCommand, ExportCommand, NetworkCommand, OutputFormat,
    SearchCommand, ShareCommand, ShowCommand, SoundCommand, StatsCommand, WriteCommand,
};
use soulscripts::entry::format_display_date;
use soulscripts::sharing;
use soulscripts::{
    init_logging, Config, Entry, Error, Journal, Mood, NetworkStatus, SaveOutcome, TcpProbe,
    WritingStats,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        command => command,
    };

    let journal = Journal::open(&config)?;

    // Execute the command
    match command {
        Command::Write(cmd) => handle_write(&journal, cmd),
        Command::Show(cmd) => handle_show(&journal, &cmd),
        Command::List(cmd) => handle_list(&journal, cmd.month.as_deref()),
        Command::Delete { id } => {
            if !journal.delete_entry(id)? {
                return Err(Error::entry_not_found(id.to_string()).into());
            }
            println!("Deleted {id}");
            Ok(())
        }
        Command::Mood { id, mood } => {
            let mood = Mood::preset(&mood)?;
            let entry = journal
                .set_mood(id, mood)?
                .ok_or_else(|| Error::entry_not_found(id.to_string()))?;
            println!("{}: {}", entry.display_title(), mood_text(&entry));
            Ok(())
        }
        Command::Title { id, title } => {
            let entry = journal
                .set_title(id, &title)?
                .ok_or_else(|| Error::entry_not_found(id.to_string()))?;
            println!("Renamed {} to \"{}\"", entry.id, entry.display_title());
            Ok(())
        }
        Command::Share(cmd) => handle_share(&config, &journal, cmd).await,
        Command::View { token } => {
            let entry = journal.shared_entry(token)?;
            print_entry(&entry);
            Ok(())
        }
        Command::Search(cmd) => handle_search(&journal, &cmd),
        Command::Stats(cmd) => handle_stats(&config, &journal, &cmd),
        Command::Export(cmd) => handle_export(&config, &journal, cmd),
        Command::Import { file } => {
            let report = backup::import_from_file(&journal, &file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!(
                "Imported {} records: {} new, {} replaced, {} kept",
                report.total(),
                report.inserted,
                report.replaced,
                report.kept
            );
            Ok(())
        }
        Command::Clear { yes } => {
            if yes {
                let removed = journal.clear_all_entries()?;
                println!("Deleted {removed} entries.");
            } else {
                println!("This will delete every journal entry.");
                println!("Use --yes to confirm.");
            }
            Ok(())
        }
        Command::Sound(cmd) => handle_sound(&config, &journal, cmd),
        Command::Network(cmd) => handle_network(&config, &journal, cmd).await,
        Command::Status(cmd) => handle_status(&config, &journal, cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn mood_text(entry: &Entry) -> String {
    entry
        .mood
        .as_ref()
        .map_or_else(|| "no mood".to_string(), ToString::to_string)
}

fn preview(content: &str, max_chars: usize) -> String {
    let line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line
    }
}

fn print_entry(entry: &Entry) {
    println!("{}  ({})", entry.display_title(), entry.id);
    println!(
        "{} | {} | {}",
        format_display_date(entry.date),
        mood_text(entry),
        if entry.shared { "shared" } else { "private" }
    );
    println!("{}", "-".repeat(40));
    println!("{}", entry.content);
}

fn print_entries(entries: &[Entry], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Plain => {
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_entry(entry);
            }
        }
        OutputFormat::Table => {
            println!("{:<10}  {:<36}  {:<20}  PREVIEW", "DATE", "ID", "TITLE");
            for entry in entries {
                println!(
                    "{:<10}  {:<36}  {:<20}  {}",
                    entry.date,
                    entry.id,
                    preview(entry.display_title(), 20),
                    preview(&entry.content, 40)
                );
            }
        }
    }
    Ok(())
}

fn handle_write(journal: &Journal, cmd: WriteCommand) -> anyhow::Result<()> {
    let date = cmd.date.unwrap_or_else(today);
    let mood = cmd.mood.as_deref().map(Mood::preset).transpose()?;
    let content = match cmd.content {
        Some(content) => content,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read entry from stdin")?;
            buf
        }
    };

    let outcome = journal.save_draft(date, cmd.id, &content)?;
    let Some(id) = outcome.entry_id() else {
        println!("Nothing to save.");
        return Ok(());
    };
    if let Some(mood) = mood {
        journal.set_mood(id, mood)?;
    }
    if let Some(title) = cmd.title.as_deref() {
        journal.set_title(id, title)?;
    }

    match outcome {
        SaveOutcome::Created(_) => println!("Created {id} for {date}"),
        SaveOutcome::Updated(_) => println!("Updated {id}"),
        SaveOutcome::Unchanged(_) => println!("No changes to {id}"),
        SaveOutcome::Skipped => {}
    }
    Ok(())
}

fn handle_show(journal: &Journal, cmd: &ShowCommand) -> anyhow::Result<()> {
    let entries = if let Some(id) = cmd.id {
        vec![journal
            .entry_by_id(id)?
            .ok_or_else(|| Error::entry_not_found(id.to_string()))?]
    } else {
        let date = cmd.date.unwrap_or_else(today);
        let entries = if cmd.all {
            journal.entries_by_date(date)?
        } else {
            journal.entry_by_date(date)?.into_iter().collect()
        };
        if entries.is_empty() && cmd.format != OutputFormat::Json {
            println!("No entries for {}.", format_display_date(date));
            return Ok(());
        }
        entries
    };
    print_entries(&entries, cmd.format)
}

fn handle_list(journal: &Journal, month: Option<&str>) -> anyhow::Result<()> {
    let (year, month) = match month {
        Some(m) => parse_month(m)?,
        None => {
            let now = today();
            (now.year(), now.month())
        }
    };

    let dates = journal.dates_with_entries(year, month)?;
    if dates.is_empty() {
        println!("No entries in {year}-{month:02}.");
        return Ok(());
    }
    for date in dates {
        let labels: Vec<String> = journal
            .entries_by_date(date)?
            .iter()
            .enumerate()
            .map(|(i, entry)| entry.tab_label(i))
            .collect();
        println!("{date}  {}", labels.join(", "));
    }
    Ok(())
}

/// Refuse sharing changes unless the network allows them.
async fn require_sharing(config: &Config, journal: &Journal) -> anyhow::Result<()> {
    let mut status = NetworkStatus::load(journal.storage())?;
    if config.sharing.require_online && !status.is_working_offline {
        status.refresh(&TcpProbe::from_config(config)).await;
    }
    sharing::ensure_available(&status, config.sharing.require_online)?;
    Ok(())
}

fn print_share_state(config: &Config, entry: &Entry) {
    match (entry.shared, entry.share_token) {
        (true, Some(token)) => println!(
            "Public link: {}",
            sharing::share_link(&config.sharing.base_url, token)
        ),
        _ => println!("Public link: off"),
    }
    if entry.shared_with.is_empty() {
        println!("Collaborators: none");
    } else {
        println!("Collaborators: {}", entry.shared_with.join(", "));
    }
}

async fn handle_share(config: &Config, journal: &Journal, cmd: ShareCommand) -> anyhow::Result<()> {
    let not_found = |id: uuid::Uuid| Error::entry_not_found(id.to_string());

    match cmd {
        ShareCommand::Add { id, email } => {
            require_sharing(config, journal).await?;
            let entry = journal.share_entry(id, &email)?.ok_or_else(|| not_found(id))?;
            print_share_state(config, &entry);
        }
        ShareCommand::Remove { id, email } => {
            require_sharing(config, journal).await?;
            let entry = journal.unshare_entry(id, &email)?.ok_or_else(|| not_found(id))?;
            print_share_state(config, &entry);
        }
        ShareCommand::Toggle { id } => {
            require_sharing(config, journal).await?;
            let entry = journal.toggle_share_status(id)?.ok_or_else(|| not_found(id))?;
            print_share_state(config, &entry);
        }
        ShareCommand::Revoke { id } => {
            require_sharing(config, journal).await?;
            journal.revoke_share_link(id)?.ok_or_else(|| not_found(id))?;
            println!("Sharing revoked for {id}");
        }
        ShareCommand::Link { id } => {
            let entry = journal.entry_by_id(id)?.ok_or_else(|| not_found(id))?;
            match (entry.shared, entry.share_token) {
                (true, Some(token)) => {
                    println!("{}", sharing::share_link(&config.sharing.base_url, token));
                }
                _ => bail!("entry {id} has no active share link; run `soul share toggle {id}`"),
            }
        }
        ShareCommand::List => {
            for entry in journal.shareable_entries()? {
                println!(
                    "{}  {}  {:<20}  {}",
                    entry.id,
                    entry.date,
                    preview(entry.display_title(), 20),
                    if entry.shared { "shared" } else { "private" }
                );
            }
        }
    }
    Ok(())
}

fn handle_search(journal: &Journal, cmd: &SearchCommand) -> anyhow::Result<()> {
    let results = journal.search(&cmd.query, cmd.limit)?;
    if results.is_empty() && cmd.format != OutputFormat::Json {
        println!("No entries match \"{}\".", cmd.query);
        return Ok(());
    }
    print_entries(&results, cmd.format)
}

fn handle_stats(config: &Config, journal: &Journal, cmd: &StatsCommand) -> anyhow::Result<()> {
    let entries = journal.export_entries()?;
    let stats = WritingStats::compute(&entries, cmd.date.unwrap_or_else(today), &config.writing);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Streak:       {} day(s)", stats.streak);
        println!(
            "Today:        {} / {} words ({:.0}%)",
            stats.todays_words, stats.daily_goal, stats.goal_progress
        );
        println!("Total words:  {}", stats.total_words);
        println!();
        println!("{}", stats.streak_message);
    }
    Ok(())
}

fn handle_export(config: &Config, journal: &Journal, cmd: ExportCommand) -> anyhow::Result<()> {
    match cmd.output {
        Some(path) if path == Path::new("-") => {
            backup::write_entries(&journal.export_entries()?, io::stdout().lock())?;
        }
        Some(path) => {
            let count = backup::export_to_file(journal, &path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {count} entries to {}", path.display());
        }
        None => {
            let path = backup::export_to_dir(journal, &config.backup_dir(), today())?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

fn handle_sound(config: &Config, journal: &Journal, cmd: SoundCommand) -> anyhow::Result<()> {
    let storage = journal.storage();
    let mut state = AudioState::load(storage, config.audio.default_volume)?;

    match cmd {
        SoundCommand::List => {
            for sound in audio::SOUNDS {
                let marker = if state.current_sound.as_deref() == Some(sound.id) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<16} {}", sound.id, sound.name);
            }
            return Ok(());
        }
        SoundCommand::Select { id } => {
            state.select(&id)?;
        }
        SoundCommand::Toggle => {
            if state.current_sound.is_none() {
                bail!("no sound selected; run `soul sound select <id>` first");
            }
            state.toggle_play();
        }
        SoundCommand::Volume { value } => {
            state.set_volume(value)?;
        }
        SoundCommand::Stop => state.stop(),
        SoundCommand::Status => {}
    }

    state.save(storage)?;
    debug!("Audio state: {:?}", state);
    print_sound_state(config, &state);
    Ok(())
}

fn print_sound_state(config: &Config, state: &AudioState) {
    match state.current() {
        Some(sound) => println!(
            "{} ({}) - {}",
            sound.name,
            sound.path_in(&config.sounds_dir()).display(),
            if state.is_playing { "playing" } else { "paused" }
        ),
        None => println!("No sound selected"),
    }
    println!("Volume: {:.0}%", state.volume * 100.0);
}

async fn handle_network(config: &Config, journal: &Journal, cmd: NetworkCommand) -> anyhow::Result<()> {
    let mut status = NetworkStatus::load(journal.storage())?;

    match cmd {
        NetworkCommand::Status => {
            status.refresh(&TcpProbe::from_config(config)).await;
            println!("Mode: {}", status.mode());
            println!(
                "Sharing: {}",
                if status.sharing_available() {
                    "available"
                } else {
                    "unavailable"
                }
            );
        }
        NetworkCommand::Offline => {
            if status.toggle_working_offline(journal.storage())? {
                println!("Working offline. Sharing is paused; writing still saves locally.");
            } else {
                println!("Back online. Sharing is available when connected.");
            }
        }
        NetworkCommand::Probe => {
            let probe = TcpProbe::from_config(config);
            let reachable = status.refresh(&probe).await;
            println!(
                "{} is {}",
                probe.address(),
                if reachable { "reachable" } else { "unreachable" }
            );
        }
    }
    Ok(())
}

fn handle_status(config: &Config, journal: &Journal, json: bool) -> anyhow::Result<()> {
    let stats = journal.storage().stats()?;
    let network = NetworkStatus::load(journal.storage())?;
    let audio = AudioState::load(journal.storage(), config.audio.default_volume)?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "total_entries": stats.total_entries,
            "shared_entries": stats.shared_entries,
            "oldest_date": stats.oldest_date,
            "newest_date": stats.newest_date,
            "db_size_bytes": stats.db_size_bytes,
            "working_offline": network.is_working_offline,
            "audio": audio,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("soul status");
        println!("-----------");
        println!("Database:      {}", config.database_path().display());
        println!("Entries:       {}", stats.total_entries);
        println!("Shared:        {}", stats.shared_entries);
        if let (Some(oldest), Some(newest)) = (stats.oldest_date, stats.newest_date) {
            println!("Range:         {oldest} to {newest}");
        }
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!(
            "Offline mode:  {}",
            if network.is_working_offline { "on" } else { "off" }
        );
        println!(
            "Sound:         {}",
            audio.current().map_or("none", |sound| sound.name)
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Backup dir:         {}", config.backup_dir().display());
                println!();
                println!("[Sharing]");
                println!("  Base URL:           {}", config.sharing.base_url);
                println!("  Require online:     {}", config.sharing.require_online);
                println!();
                println!("[Network]");
                println!("  Probe address:      {}", config.network.probe_address);
                println!("  Probe timeout (ms): {}", config.network.probe_timeout_ms);
                println!();
                println!("[Audio]");
                println!("  Default volume:     {}", config.audio.default_volume);
                println!("  Sounds dir:         {}", config.sounds_dir().display());
                println!();
                println!("[Writing]");
                println!("  Daily word goal:    {}", config.writing.daily_word_goal);
                println!("  Streak window:      {}", config.writing.streak_window_days);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
