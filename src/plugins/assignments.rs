//! Busy-period store: who teaches which class at which (day, period).
//!
//! `save`, `delete` and `clear` are plain data access with no policy. The
//! manual-edit path (`assign_slot`) is the one place that runs the conflict
//! rules before writing.

use crate::core::config::Settings;
use crate::core::error;
use crate::core::model::{Grade, Section, Slot, SubjectName, Weekday};
use crate::core::output;
use crate::core::schemas;
use crate::core::store::Store;
use crate::plugins::{constraints, queries, roster};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BusyPeriod {
    pub id: i64,
    pub teacher_id: i64,
    pub grade: Grade,
    pub section: Section,
    pub period: u32,
    pub day: Weekday,
}

/// Current occupant of a slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Occupant {
    pub id: i64,
    pub teacher_name: String,
    pub subject: SubjectName,
}

/// Result of a successful manual assignment.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Assigned {
    pub id: i64,
    /// Occupant that was overwritten in place, if the slot was taken.
    pub replaced: Option<Occupant>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SlotArgs {
    #[clap(long)]
    pub day: String,
    #[clap(long)]
    pub period: u32,
    #[clap(long)]
    pub grade: String,
    #[clap(long)]
    pub section: String,
}

impl SlotArgs {
    pub fn to_slot(&self) -> Result<Slot, error::TimetableError> {
        Ok(Slot::new(
            self.day.parse()?,
            self.period,
            Grade::new(&self.grade)?,
            Section::new(&self.section)?,
        ))
    }
}

#[derive(Parser, Debug)]
#[clap(name = "slot", about = "Inspect and edit single timetable slots.")]
pub struct SlotCli {
    #[clap(subcommand)]
    pub command: SlotCommand,
}

#[derive(Subcommand, Debug)]
pub enum SlotCommand {
    /// Show the current occupant of a slot.
    Show {
        #[clap(flatten)]
        slot: SlotArgs,
    },
    /// Assign a teacher to a slot, subject to the conflict rules.
    Assign {
        #[clap(flatten)]
        slot: SlotArgs,
        #[clap(long)]
        teacher_id: i64,
    },
    /// Clear a slot.
    Free {
        #[clap(flatten)]
        slot: SlotArgs,
    },
    /// Dry-run the conflict rules without writing.
    Check {
        #[clap(flatten)]
        slot: SlotArgs,
        #[clap(long)]
        teacher_id: i64,
    },
}

pub fn initialize_assignments_db(root: &Path) -> Result<(), error::TimetableError> {
    let store = Store::new(root);
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.init", |conn| {
            conn.execute(schemas::BUSY_PERIODS_SCHEMA, [])?;
            conn.execute(schemas::BUSY_PERIODS_SLOT_INDEX, [])?;
            conn.execute(schemas::BUSY_PERIODS_TEACHER_INDEX, [])?;
            Ok(())
        })
}

pub(crate) fn save_on(
    conn: &Connection,
    id: Option<i64>,
    teacher_id: i64,
    grade: &Grade,
    section: &Section,
    period: u32,
    day: Weekday,
) -> Result<i64, error::TimetableError> {
    match id {
        Some(id) => {
            let changed = conn.execute(
                "UPDATE teacher_busy_periods
                 SET teacher_id = ?1, grade = ?2, section = ?3, period_number = ?4, day_of_week = ?5
                 WHERE id = ?6",
                params![teacher_id, grade, section, period, day, id],
            )?;
            if changed == 0 {
                return Err(error::TimetableError::NotFound(format!(
                    "busy period {}",
                    id
                )));
            }
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO teacher_busy_periods(teacher_id, grade, section, period_number, day_of_week)
                 VALUES(?1, ?2, ?3, ?4, ?5)",
                params![teacher_id, grade, section, period, day],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

pub(crate) fn occupant_on(
    conn: &Connection,
    slot: &Slot,
) -> Result<Option<Occupant>, error::TimetableError> {
    let occupant = conn
        .query_row(
            "SELECT tbp.id, t.teacher_name, t.subject
             FROM teacher_busy_periods tbp JOIN teachers t ON tbp.teacher_id = t.id
             WHERE tbp.day_of_week = ?1 AND tbp.period_number = ?2 AND tbp.grade = ?3 AND tbp.section = ?4
             ORDER BY tbp.id LIMIT 1",
            params![slot.day, slot.period, slot.grade, slot.section],
            |row| {
                Ok(Occupant {
                    id: row.get(0)?,
                    teacher_name: row.get(1)?,
                    subject: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(occupant)
}

/// Delete every busy period. Returns how many were removed.
pub fn clear(store: &Store) -> Result<usize, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.clear", |conn| {
            Ok(conn.execute("DELETE FROM teacher_busy_periods", [])?)
        })
}

/// Insert a busy period, or overwrite record `id` when given. No validation.
pub fn save(
    store: &Store,
    id: Option<i64>,
    teacher_id: i64,
    grade: &Grade,
    section: &Section,
    period: u32,
    day: Weekday,
) -> Result<i64, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.save", |conn| {
            save_on(conn, id, teacher_id, grade, section, period, day)
        })
}

pub fn get_assignment(
    store: &Store,
    day: Weekday,
    period: u32,
    grade: &Grade,
    section: &Section,
) -> Result<Option<Occupant>, error::TimetableError> {
    let slot = Slot::new(day, period, grade.clone(), section.clone());
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.get_assignment", |conn| {
            occupant_on(conn, &slot)
        })
}

/// Returns whether a record was removed.
pub fn delete(store: &Store, id: i64) -> Result<bool, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.delete", |conn| {
            let n = conn.execute("DELETE FROM teacher_busy_periods WHERE id = ?1", params![id])?;
            Ok(n > 0)
        })
}

pub fn get(store: &Store, id: i64) -> Result<Option<BusyPeriod>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.get", |conn| {
            let record = conn
                .query_row(
                    "SELECT id, teacher_id, grade, section, period_number, day_of_week
                     FROM teacher_busy_periods WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(BusyPeriod {
                            id: row.get(0)?,
                            teacher_id: row.get(1)?,
                            grade: row.get(2)?,
                            section: row.get(3)?,
                            period: row.get(4)?,
                            day: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
}

pub fn count(store: &Store) -> Result<usize, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.count", |conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM teacher_busy_periods", [], |row| row.get(0))?;
            Ok(n as usize)
        })
}

/// Put `teacher_id` into `slot` the way the edit surface does.
///
/// The slot's current record, if any, is updated in place. Conflicts come back
/// as `TimetableError::Conflict` and leave the store untouched.
pub fn assign_slot(
    store: &Store,
    settings: &Settings,
    slot: &Slot,
    teacher_id: i64,
) -> Result<Assigned, error::TimetableError> {
    settings.validate_slot(slot.day, slot.period)?;
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.assign_slot", |conn| {
            let tx = conn.unchecked_transaction()?;
            let teacher = roster::load_teacher(&tx, teacher_id)?.ok_or_else(|| {
                error::TimetableError::NotFound(format!("teacher {}", teacher_id))
            })?;
            if !teacher.grades.contains(&slot.grade) {
                return Err(error::TimetableError::ValidationError(format!(
                    "{} does not teach grade {}",
                    teacher.name, slot.grade
                )));
            }

            let current = occupant_on(&tx, slot)?;
            let exempt = queries::exempt_sections_on(&tx, &slot.grade)?;
            if let Some(conflict) =
                constraints::check_on(&tx, settings, slot, teacher_id, &teacher.subject, &exempt)?
            {
                return Err(conflict.into());
            }

            let id = save_on(
                &tx,
                current.as_ref().map(|c| c.id),
                teacher_id,
                &slot.grade,
                &slot.section,
                slot.period,
                slot.day,
            )?;
            tx.commit()?;
            Ok(Assigned {
                id,
                replaced: current,
            })
        })
}

/// Clear a slot. Returns the occupant that was removed, if any.
pub fn free_slot(store: &Store, slot: &Slot) -> Result<Option<Occupant>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "assignments.free_slot", |conn| {
            let current = occupant_on(conn, slot)?;
            if let Some(occupant) = &current {
                conn.execute(
                    "DELETE FROM teacher_busy_periods WHERE id = ?1",
                    params![occupant.id],
                )?;
            }
            Ok(current)
        })
}

pub fn run_slot_cli(
    store: &Store,
    settings: &Settings,
    cli: SlotCli,
) -> Result<(), error::TimetableError> {
    match cli.command {
        SlotCommand::Show { slot } => {
            let slot = slot.to_slot()?;
            match get_assignment(store, slot.day, slot.period, &slot.grade, &slot.section)? {
                Some(o) => println!("Teacher: {}  |  Subject: {}", o.teacher_name.bold(), o.subject),
                None => println!("{}", "Free".dimmed()),
            }
        }
        SlotCommand::Assign { slot, teacher_id } => {
            let slot = slot.to_slot()?;
            let assigned = assign_slot(store, settings, &slot, teacher_id)?;
            println!(
                "{}",
                output::command_envelope(
                    "slot.assign",
                    "ok",
                    serde_json::json!({ "id": assigned.id, "slot": slot, "replaced": assigned.replaced }),
                )
            );
        }
        SlotCommand::Free { slot } => {
            let slot = slot.to_slot()?;
            match free_slot(store, &slot)? {
                Some(o) => println!("{} {} ({})", "cleared".green().bold(), slot, o.subject),
                None => println!("Nothing to clear."),
            }
        }
        SlotCommand::Check { slot, teacher_id } => {
            let slot = slot.to_slot()?;
            settings.validate_slot(slot.day, slot.period)?;
            let teacher = roster::get_teacher(store, teacher_id)?.ok_or_else(|| {
                error::TimetableError::NotFound(format!("teacher {}", teacher_id))
            })?;
            let exempt = queries::exempt_sections_for_grade(store, &slot.grade)?;
            match constraints::check(store, settings, &slot, teacher_id, &teacher.subject, &exempt)? {
                Some(conflict) => println!("{} {}", "rejected".red().bold(), conflict),
                None => println!("{} {}", "ok".green().bold(), slot),
            }
        }
    }
    Ok(())
}
