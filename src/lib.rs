//! Timetable: a local-first core for weekly school timetables.
//!
//! Teachers are placed into (day, period, grade, section) slots. Every manual
//! placement is checked against two conflict rules before it is stored, and a
//! first-fit coverage pass guarantees each grade/section at least one Games
//! period per week.
//!
//! # Architecture
//!
//! All state lives in one SQLite file inside the data directory. Every access
//! goes through `DbBroker`, which serializes in-process callers and appends an
//! audit line to `timetable.events.jsonl`.
//!
//! ## Subsystems
//!
//! - `roster`: teachers, subjects, subject-name registry and colors
//! - `assignments`: busy-period store and the manual-edit path
//! - `constraints`: teacher double-booking and the daily subject cap
//! - `coverage`: Games coverage with first-fit placement
//! - `queries`: lookups and the week-ordered timetable projection
//!
//! # Examples
//!
//! ```bash
//! timetable init
//! timetable roster add-subject --name Math --grade 5 --sections A,B
//! timetable roster add-teacher --name "Ms. Rao" --subject Math --grades 5,6
//! timetable slot assign --day Mon --period 1 --grade 5 --section A --teacher-id 1
//! timetable generate
//! timetable view --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: store handle, broker, schemas, configuration, domain types
//! - [`plugins`]: subsystem implementations

pub mod core;
pub mod plugins;

mod cli;
mod subsystems;

pub use subsystems::initialize_all_dbs;

use cli::{Cli, Command, SettingsCommand};
use crate::core::{
    config::{self, Settings},
    error,
    model::{Grade, Section},
    output,
    store::{DATA_DIR_ENV, DEFAULT_DATA_DIR, Store},
};
use crate::plugins::{assignments, coverage, queries, roster};

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn run() -> Result<(), error::TimetableError> {
    let cli = Cli::parse();
    let store = Store::new(resolve_data_dir(cli.data_dir));

    // Table creation is idempotent, so every command can rely on the schema.
    initialize_all_dbs(&store.root)?;

    if let Command::Init = cli.command {
        println!(
            "{} timetable database at {}",
            "initialized".green().bold(),
            store.db_path().display()
        );
        return Ok(());
    }

    let settings = Settings::resolve(&store)?;

    match cli.command {
        Command::Init => {}
        Command::Settings(group) => match group.command {
            SettingsCommand::Show => {
                println!(
                    "{}",
                    output::command_envelope(
                        "settings.show",
                        "ok",
                        serde_json::json!({ "settings": settings }),
                    )
                );
            }
            SettingsCommand::Set { periods_per_day } => {
                config::set_periods_per_day(&store, periods_per_day)?;
                println!(
                    "{} periods_per_day = {}",
                    "saved".green().bold(),
                    periods_per_day
                );
            }
        },
        Command::Roster(roster_cli) => roster::run_roster_cli(&store, roster_cli)?,
        Command::Slot(slot_cli) => assignments::run_slot_cli(&store, &settings, slot_cli)?,
        Command::Generate => coverage::run_generate_cli(&store, &settings)?,
        Command::EnsureGames { grade, section } => coverage::run_ensure_games_cli(
            &store,
            &settings,
            &Grade::new(&grade)?,
            &Section::new(&section)?,
        )?,
        Command::View { format } => queries::run_view_cli(&store, &settings, format)?,
        Command::Reset => {
            let removed = assignments::clear(&store)?;
            println!("{} {} assignments", "cleared".green().bold(), removed);
        }
    }

    Ok(())
}
