//! Conflict rules for a proposed assignment.
//!
//! Rules run in order and the first violation wins:
//! 1. A teacher cannot be in two classes at the same (day, period). An existing
//!    record for the *same* grade and section is not a conflict; identity is
//!    grade+section equality, not record id.
//! 2. A subject may appear at most `max_daily_per_subject` times per day for a
//!    grade/section, unless the section is exempt.

use crate::core::config::Settings;
use crate::core::error;
use crate::core::model::{Grade, Section, Slot, SubjectName, Weekday};
use crate::core::store::Store;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    #[error("Teacher is already assigned at {day} period {period} for grade {grade} section {section}.")]
    TeacherDoubleBooked {
        day: Weekday,
        period: u32,
        grade: Grade,
        section: Section,
    },
    #[error("Subject '{subject}' already assigned {limit} on {day} for grade {grade} section {section}.")]
    SubjectDailyLimit {
        subject: SubjectName,
        day: Weekday,
        grade: Grade,
        section: Section,
        limit: DailyLimit,
    },
}

/// Daily cap, rendered the way operators read it ("twice", "3 times").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DailyLimit(pub u32);

impl fmt::Display for DailyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => f.write_str("once"),
            2 => f.write_str("twice"),
            n => write!(f, "{} times", n),
        }
    }
}

fn teacher_conflict(
    conn: &Connection,
    slot: &Slot,
    teacher_id: i64,
) -> Result<Option<Conflict>, error::TimetableError> {
    let mut stmt = conn.prepare(
        "SELECT grade, section FROM teacher_busy_periods
         WHERE day_of_week = ?1 AND period_number = ?2 AND teacher_id = ?3
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![slot.day, slot.period, teacher_id], |row| {
        Ok((row.get::<_, Grade>(0)?, row.get::<_, Section>(1)?))
    })?;
    for r in rows {
        let (grade, section) = r?;
        if grade != slot.grade || section != slot.section {
            return Ok(Some(Conflict::TeacherDoubleBooked {
                day: slot.day,
                period: slot.period,
                grade,
                section,
            }));
        }
    }
    Ok(None)
}

/// Records on (day, grade, section) taught by a teacher of `subject`.
pub(crate) fn daily_subject_count(
    conn: &Connection,
    day: Weekday,
    grade: &Grade,
    section: &Section,
    subject: &SubjectName,
) -> Result<u32, error::TimetableError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM teacher_busy_periods tbp JOIN teachers t ON tbp.teacher_id = t.id
         WHERE tbp.day_of_week = ?1 AND tbp.grade = ?2 AND tbp.section = ?3 AND t.subject = ?4",
        params![day, grade, section, subject],
        |row| row.get(0),
    )?;
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

pub(crate) fn check_on(
    conn: &Connection,
    settings: &Settings,
    slot: &Slot,
    teacher_id: i64,
    subject: &SubjectName,
    exempt_sections: &BTreeSet<Section>,
) -> Result<Option<Conflict>, error::TimetableError> {
    if let Some(conflict) = teacher_conflict(conn, slot, teacher_id)? {
        return Ok(Some(conflict));
    }

    if !exempt_sections.contains(&slot.section) {
        let n = daily_subject_count(conn, slot.day, &slot.grade, &slot.section, subject)?;
        if n >= settings.max_daily_per_subject {
            return Ok(Some(Conflict::SubjectDailyLimit {
                subject: subject.clone(),
                day: slot.day,
                grade: slot.grade.clone(),
                section: slot.section.clone(),
                limit: DailyLimit(settings.max_daily_per_subject),
            }));
        }
    }

    Ok(None)
}

/// `None` when the assignment may be saved, otherwise the first rule it breaks.
///
/// Read-only. Persisting is the caller's job.
pub fn check(
    store: &Store,
    settings: &Settings,
    slot: &Slot,
    teacher_id: i64,
    subject: &SubjectName,
    exempt_sections: &BTreeSet<Section>,
) -> Result<Option<Conflict>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "constraints.check", |conn| {
            check_on(conn, settings, slot, teacher_id, subject, exempt_sections)
        })
}
