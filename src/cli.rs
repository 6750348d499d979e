//! CLI struct definitions for the timetable command-line interface.
//!
//! Top-level clap types live here; each subsystem owns its own `*Cli` group.
//! Dispatch lives in `lib.rs`.

use crate::plugins::{assignments, queries, roster};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "timetable",
    version = env!("CARGO_PKG_VERSION"),
    about = "Weekly school timetable: manual slot edits with conflict checks, and Games coverage."
)]
pub(crate) struct Cli {
    /// Data directory. Defaults to $TIMETABLE_HOME, then ./.timetable.
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SettingsCli {
    #[clap(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SettingsCommand {
    /// Print the resolved settings.
    Show,
    /// Persist a new value.
    Set {
        #[clap(long)]
        periods_per_day: u32,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the data directory and database tables.
    Init,
    /// Show or change persisted settings.
    Settings(SettingsCli),
    /// Register teachers and subjects.
    Roster(roster::RosterCli),
    /// Inspect and edit single slots.
    Slot(assignments::SlotCli),
    /// Make sure every grade/section has at least one Games period.
    Generate,
    /// Run the Games coverage pass for one grade/section.
    EnsureGames {
        #[clap(long)]
        grade: String,
        #[clap(long)]
        section: String,
    },
    /// Print the whole timetable in week order.
    View {
        #[clap(long, value_enum, default_value = "text")]
        format: queries::OutputFormat,
    },
    /// Delete every assignment.
    Reset,
}
