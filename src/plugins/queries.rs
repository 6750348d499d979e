//! Read-only lookups shared by the checker, the coverage pass and the edit surface.
//!
//! Empty results are plain empty collections; nothing here errors on "no rows".

use crate::core::config::Settings;
use crate::core::error;
use crate::core::model::{Grade, Section, SubjectName, Weekday, parse_sections};
use crate::core::output;
use crate::core::store::Store;
use crate::plugins::roster::{self, Teacher};
use clap::ValueEnum;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One row of the read projection used for display and export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimetableRow {
    pub id: i64,
    pub teacher_name: String,
    pub subject: SubjectName,
    pub grade: Grade,
    pub section: Section,
    pub period: u32,
    pub day: Weekday,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub(crate) fn grades_on(conn: &Connection) -> Result<Vec<Grade>, error::TimetableError> {
    let mut stmt = conn.prepare("SELECT grade FROM subjects GROUP BY grade ORDER BY MIN(id)")?;
    let rows = stmt.query_map([], |row| row.get::<_, Grade>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub(crate) fn sections_on(
    conn: &Connection,
    grade: &Grade,
) -> Result<BTreeSet<Section>, error::TimetableError> {
    let mut stmt = conn.prepare("SELECT sections FROM subjects WHERE grade = ?1")?;
    let rows = stmt.query_map(params![grade], |row| row.get::<_, String>(0))?;
    let mut sections = BTreeSet::new();
    for r in rows {
        sections.extend(parse_sections(&r?));
    }
    Ok(sections)
}

pub(crate) fn exempt_sections_on(
    _conn: &Connection,
    _grade: &Grade,
) -> Result<BTreeSet<Section>, error::TimetableError> {
    // No section currently meets on fewer days than the rest of its grade.
    Ok(BTreeSet::new())
}

/// Distinct grades that have at least one subject, in first-registered order.
pub fn grades(store: &Store) -> Result<Vec<Grade>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.grades", grades_on)
}

/// Union of the section lists of every subject in `grade`, sorted and deduplicated.
pub fn sections_for_grade(
    store: &Store,
    grade: &Grade,
) -> Result<BTreeSet<Section>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.sections", |conn| {
            sections_on(conn, grade)
        })
}

/// Teachers of exactly `subject` whose grade set contains `grade`.
pub fn teachers_for(
    store: &Store,
    subject: &SubjectName,
    grade: &Grade,
) -> Result<Vec<Teacher>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.teachers_for", |conn| {
            let teachers = roster::load_teachers_by_subject(conn, subject)?;
            Ok(teachers
                .into_iter()
                .filter(|t| t.grades.contains(grade))
                .collect())
        })
}

/// Subject names registered for `grade`, in storage order.
pub fn subjects_for_grade(
    store: &Store,
    grade: &Grade,
) -> Result<Vec<SubjectName>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.subjects", |conn| {
            let mut stmt =
                conn.prepare("SELECT subject_name FROM subjects WHERE grade = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![grade], |row| row.get::<_, SubjectName>(0))?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
}

/// Sections of `grade` that are exempt from the daily subject cap. Always empty for now.
pub fn exempt_sections_for_grade(
    store: &Store,
    grade: &Grade,
) -> Result<BTreeSet<Section>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.exempt", |conn| {
            exempt_sections_on(conn, grade)
        })
}

pub fn subject_colors(store: &Store) -> Result<BTreeMap<SubjectName, String>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.colors", |conn| {
            let mut stmt = conn.prepare("SELECT subject_name, color_code FROM subject_colors")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, SubjectName>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut out = BTreeMap::new();
            for r in rows {
                let (name, color) = r?;
                out.insert(name, color);
            }
            Ok(out)
        })
}

/// Every busy period joined with its teacher, in week order (configured day
/// order, then period, grade, section).
pub fn timetable(
    store: &Store,
    settings: &Settings,
) -> Result<Vec<TimetableRow>, error::TimetableError> {
    let mut rows = store
        .broker()
        .with_conn(&store.db_path(), "timetable", "queries.timetable", |conn| {
            let mut stmt = conn.prepare(
                "SELECT tbp.id, t.teacher_name, t.subject, tbp.grade, tbp.section, tbp.period_number, tbp.day_of_week
                 FROM teacher_busy_periods tbp JOIN teachers t ON tbp.teacher_id = t.id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(TimetableRow {
                    id: row.get(0)?,
                    teacher_name: row.get(1)?,
                    subject: row.get(2)?,
                    grade: row.get(3)?,
                    section: row.get(4)?,
                    period: row.get(5)?,
                    day: row.get(6)?,
                })
            })?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })?;

    // Days outside the configured week sort last.
    let day_rank = |d: Weekday| settings.day_index(d).unwrap_or(usize::MAX);
    rows.sort_by(|a, b| {
        (day_rank(a.day), a.period, &a.grade, &a.section, a.id)
            .cmp(&(day_rank(b.day), b.period, &b.grade, &b.section, b.id))
    });
    Ok(rows)
}

pub fn run_view_cli(
    store: &Store,
    settings: &Settings,
    format: OutputFormat,
) -> Result<(), error::TimetableError> {
    let rows = timetable(store, settings)?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                output::command_envelope(
                    "view",
                    "ok",
                    serde_json::json!({ "count": rows.len(), "rows": rows }),
                )
            );
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No timetable generated yet.");
                return Ok(());
            }
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.teacher_name.clone(),
                        r.subject.to_string(),
                        r.grade.to_string(),
                        r.section.to_string(),
                        r.period.to_string(),
                        r.day.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                output::render_table(
                    &["id", "teacher", "subject", "grade", "section", "period", "day"],
                    &cells,
                )
            );
        }
    }
    Ok(())
}
