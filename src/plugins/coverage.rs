//! Minimum weekly coverage of the mandatory subject (Games).
//!
//! `ensure_games` is a first-fit pass: if a grade/section has no Games period,
//! the first free (day, period) in week order gets one. It writes directly and
//! does not consult the conflict rules, so the Games teacher may end up
//! double-booked and the daily cap is not applied.

use crate::core::config::Settings;
use crate::core::error;
use crate::core::model::{Grade, GradeSet, Section, Slot, SubjectName, Weekday};
use crate::core::output;
use crate::core::store::Store;
use crate::plugins::{assignments, queries, roster};
use colored::Colorize;
use rusqlite::{Connection, params};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Placement {
    /// The grade/section already has this many mandatory-subject periods.
    AlreadyCovered { periods: u32 },
    Placed {
        id: i64,
        teacher_id: i64,
        /// The fallback teacher had to be created for this placement.
        created_teacher: bool,
        day: Weekday,
        period: u32,
    },
    /// Every slot of the week is taken; nothing was written.
    NoFreeSlot,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CoverageOutcome {
    pub grade: Grade,
    pub section: Section,
    pub placement: Placement,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub outcomes: Vec<CoverageOutcome>,
}

impl CoverageReport {
    pub fn placed(&self) -> usize {
        self.count(|p| matches!(p, Placement::Placed { .. }))
    }

    pub fn exhausted(&self) -> usize {
        self.count(|p| matches!(p, Placement::NoFreeSlot))
    }

    fn count(&self, f: impl Fn(&Placement) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.placement)).count()
    }
}

fn coverage_count(
    conn: &Connection,
    grade: &Grade,
    section: &Section,
    subject: &SubjectName,
) -> Result<u32, error::TimetableError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM teacher_busy_periods tbp JOIN teachers t ON tbp.teacher_id = t.id
         WHERE tbp.grade = ?1 AND tbp.section = ?2 AND t.subject = ?3",
        params![grade, section, subject],
        |row| row.get(0),
    )?;
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

fn first_free_slot(
    conn: &Connection,
    settings: &Settings,
    grade: &Grade,
    section: &Section,
) -> Result<Option<Slot>, error::TimetableError> {
    for &day in &settings.weekdays {
        for period in settings.periods() {
            let slot = Slot::new(day, period, grade.clone(), section.clone());
            let taken: i64 = conn.query_row(
                "SELECT COUNT(*) FROM teacher_busy_periods
                 WHERE day_of_week = ?1 AND period_number = ?2 AND grade = ?3 AND section = ?4",
                params![slot.day, slot.period, slot.grade, slot.section],
                |row| row.get(0),
            )?;
            if taken == 0 {
                return Ok(Some(slot));
            }
        }
    }
    Ok(None)
}

/// Lowest-id teacher of the mandatory subject for `grade`, creating the fallback
/// teacher when there is none. The flag reports whether one was created.
fn resolve_teacher(
    conn: &Connection,
    settings: &Settings,
    grade: &Grade,
) -> Result<(i64, bool), error::TimetableError> {
    let existing = roster::load_teachers_by_subject(conn, &settings.mandatory_subject)?
        .into_iter()
        .find(|t| t.grades.contains(grade));
    if let Some(teacher) = existing {
        return Ok((teacher.id, false));
    }
    let id = roster::insert_teacher(
        conn,
        &settings.fallback_teacher_name,
        &settings.mandatory_subject,
        &GradeSet::single(grade.clone()),
    )?;
    Ok((id, true))
}

pub fn has_coverage(
    store: &Store,
    settings: &Settings,
    grade: &Grade,
    section: &Section,
) -> Result<bool, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "coverage.check", |conn| {
            Ok(coverage_count(conn, grade, section, &settings.mandatory_subject)? >= 1)
        })
}

/// One coverage step on an open transaction; the caller commits.
fn place_games_on(
    conn: &Connection,
    settings: &Settings,
    grade: &Grade,
    section: &Section,
) -> Result<Placement, error::TimetableError> {
    let periods = coverage_count(conn, grade, section, &settings.mandatory_subject)?;
    if periods >= 1 {
        return Ok(Placement::AlreadyCovered { periods });
    }

    // Slot first: an exhausted week must not leave a fallback teacher behind.
    let Some(slot) = first_free_slot(conn, settings, grade, section)? else {
        return Ok(Placement::NoFreeSlot);
    };

    let (teacher_id, created_teacher) = resolve_teacher(conn, settings, grade)?;
    let id = assignments::save_on(
        conn,
        None,
        teacher_id,
        &slot.grade,
        &slot.section,
        slot.period,
        slot.day,
    )?;

    Ok(Placement::Placed {
        id,
        teacher_id,
        created_teacher,
        day: slot.day,
        period: slot.period,
    })
}

/// Give (grade, section) one mandatory-subject period if it has none.
pub fn ensure_games(
    store: &Store,
    settings: &Settings,
    grade: &Grade,
    section: &Section,
) -> Result<Placement, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "coverage.ensure_games", |conn| {
            let tx = conn.unchecked_transaction()?;
            let placement = place_games_on(&tx, settings, grade, section)?;
            tx.commit()?;
            Ok(placement)
        })
}

/// Run `ensure_games` for every section of every grade that has subjects.
///
/// The whole pass is one transaction: an error on any grade/section rolls back
/// every placement made before it.
pub fn ensure_coverage_all(
    store: &Store,
    settings: &Settings,
) -> Result<CoverageReport, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "coverage.generate", |conn| {
            let tx = conn.unchecked_transaction()?;
            let mut report = CoverageReport::default();
            for grade in queries::grades_on(&tx)? {
                for section in queries::sections_on(&tx, &grade)? {
                    let placement = place_games_on(&tx, settings, &grade, &section)?;
                    report.outcomes.push(CoverageOutcome {
                        grade: grade.clone(),
                        section,
                        placement,
                    });
                }
            }
            tx.commit()?;
            Ok(report)
        })
}

fn describe(placement: &Placement) -> String {
    match placement {
        Placement::AlreadyCovered { periods } => format!("covered ({} periods)", periods),
        Placement::Placed {
            day,
            period,
            created_teacher,
            ..
        } => {
            let suffix = if *created_teacher { ", new teacher" } else { "" };
            format!("placed {} period {}{}", day, period, suffix)
        }
        Placement::NoFreeSlot => "no free slot".to_string(),
    }
}

pub fn run_generate_cli(store: &Store, settings: &Settings) -> Result<(), error::TimetableError> {
    let report = ensure_coverage_all(store, settings)?;
    if report.outcomes.is_empty() {
        println!("No grades registered; nothing to generate.");
        return Ok(());
    }
    for o in &report.outcomes {
        let line = format!("grade {} section {}: {}", o.grade, o.section, describe(&o.placement));
        match o.placement {
            Placement::NoFreeSlot => println!("{}", line.yellow()),
            _ => println!("{}", line),
        }
    }
    println!(
        "{} {} placed, {} without a free slot",
        "generated".green().bold(),
        report.placed(),
        report.exhausted()
    );
    Ok(())
}

pub fn run_ensure_games_cli(
    store: &Store,
    settings: &Settings,
    grade: &Grade,
    section: &Section,
) -> Result<(), error::TimetableError> {
    let placement = ensure_games(store, settings, grade, section)?;
    let status = match placement {
        Placement::NoFreeSlot => "no_free_slot",
        _ => "ok",
    };
    println!(
        "{}",
        output::command_envelope(
            "ensure-games",
            status,
            serde_json::json!({ "grade": grade, "section": section, "placement": placement }),
        )
    );
    Ok(())
}
