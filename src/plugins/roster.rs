//! Teachers, subjects, and the subject-name registry.
//!
//! `subject_colors` doubles as the registry of subject names: a teacher or
//! subject row can only be written after its subject name has been registered
//! there, which the foreign keys enforce. Registration assigns a random pastel
//! color once and never changes it.

use crate::core::error;
use crate::core::model::{Grade, GradeSet, Section, SubjectName, parse_sections};
use crate::core::schemas;
use crate::core::store::Store;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub subject: SubjectName,
    pub grades: GradeSet,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub name: SubjectName,
    pub grade: Grade,
    pub periods_per_week: u32,
    pub sections: Vec<Section>,
}

/// One teacher row as delivered by a bulk import.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeacherImport {
    pub teacher_name: String,
    pub subject: String,
    pub grades: String,
}

/// One subject row as delivered by a bulk import. Sections default to `"A"`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubjectImport {
    pub subject_name: String,
    pub grade: String,
    pub periods_per_week: u32,
    #[serde(default)]
    pub sections: Option<String>,
}

#[derive(Parser, Debug)]
#[clap(name = "roster", about = "Register teachers and subjects.")]
pub struct RosterCli {
    #[clap(subcommand)]
    pub command: RosterCommand,
}

#[derive(Subcommand, Debug)]
pub enum RosterCommand {
    /// Register a teacher.
    AddTeacher {
        #[clap(long)]
        name: String,
        #[clap(long)]
        subject: String,
        /// Grades taught, e.g. "5,6,7".
        #[clap(long)]
        grades: String,
    },
    /// Register a subject for one grade.
    AddSubject {
        #[clap(long)]
        name: String,
        #[clap(long)]
        grade: String,
        #[clap(long, default_value_t = 1)]
        periods_per_week: u32,
        /// Comma-separated sections, e.g. "A,B".
        #[clap(long, default_value = "A")]
        sections: String,
    },
    /// Bulk import from JSON arrays of rows.
    Import {
        #[clap(long)]
        teachers: Option<PathBuf>,
        #[clap(long)]
        subjects: Option<PathBuf>,
    },
    /// List teachers.
    Teachers,
    /// List subjects.
    Subjects,
    /// Show subject colors.
    Colors,
}

pub fn initialize_roster_db(root: &Path) -> Result<(), error::TimetableError> {
    let store = Store::new(root);
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.init", |conn| {
            conn.execute(schemas::SUBJECT_COLORS_SCHEMA, [])?;
            conn.execute(schemas::TEACHERS_SCHEMA, [])?;
            conn.execute(schemas::TEACHERS_SUBJECT_INDEX, [])?;
            conn.execute(schemas::SUBJECTS_SCHEMA, [])?;
            conn.execute(schemas::SUBJECTS_GRADE_INDEX, [])?;
            Ok(())
        })
}

/// `#rrggbb` with every channel in `150..=255`.
pub fn random_pastel<R: Rng>(rng: &mut R) -> String {
    let mut channel = || rng.random_range(150..=255u8);
    format!("#{:02x}{:02x}{:02x}", channel(), channel(), channel())
}

pub(crate) fn ensure_subject_color_on(
    conn: &Connection,
    subject: &SubjectName,
) -> Result<String, error::TimetableError> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT color_code FROM subject_colors WHERE subject_name = ?1",
            params![subject],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(color) = existing {
        return Ok(color);
    }
    let color = random_pastel(&mut rand::rng());
    conn.execute(
        "INSERT INTO subject_colors(subject_name, color_code) VALUES(?1, ?2)",
        params![subject, color],
    )?;
    Ok(color)
}

/// Color for `subject`, registering the name on first sight.
pub fn ensure_subject_color(
    store: &Store,
    subject: &SubjectName,
) -> Result<String, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.color", |conn| {
            ensure_subject_color_on(conn, subject)
        })
}

pub(crate) fn insert_teacher(
    conn: &Connection,
    name: &str,
    subject: &SubjectName,
    grades: &GradeSet,
) -> Result<i64, error::TimetableError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(error::TimetableError::ValidationError(
            "teacher name must not be empty".to_string(),
        ));
    }
    if grades.is_empty() {
        return Err(error::TimetableError::ValidationError(format!(
            "teacher '{}' has no grades",
            name
        )));
    }
    ensure_subject_color_on(conn, subject)?;
    conn.execute(
        "INSERT INTO teachers(teacher_name, subject, grades) VALUES(?1, ?2, ?3)",
        params![name, subject, grades.to_stored()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_subject(
    conn: &Connection,
    name: &SubjectName,
    grade: &Grade,
    periods_per_week: u32,
    sections: &[Section],
) -> Result<i64, error::TimetableError> {
    if sections.is_empty() {
        return Err(error::TimetableError::ValidationError(format!(
            "subject '{}' for grade {} lists no sections",
            name, grade
        )));
    }
    ensure_subject_color_on(conn, name)?;
    let stored = sections
        .iter()
        .map(Section::as_str)
        .collect::<Vec<_>>()
        .join(",");
    conn.execute(
        "INSERT INTO subjects(subject_name, grade, periods_per_week, sections) VALUES(?1, ?2, ?3, ?4)",
        params![name, grade, periods_per_week, stored],
    )?;
    Ok(conn.last_insert_rowid())
}

fn teacher_from_row(row: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        grades: row.get(3)?,
    })
}

fn subject_from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    let sections: String = row.get(4)?;
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        grade: row.get(2)?,
        periods_per_week: row.get(3)?,
        sections: parse_sections(&sections),
    })
}

pub(crate) fn load_teacher(
    conn: &Connection,
    id: i64,
) -> Result<Option<Teacher>, error::TimetableError> {
    let teacher = conn
        .query_row(
            "SELECT id, teacher_name, subject, grades FROM teachers WHERE id = ?1",
            params![id],
            teacher_from_row,
        )
        .optional()?;
    Ok(teacher)
}

/// Teachers for `subject` in id order.
pub(crate) fn load_teachers_by_subject(
    conn: &Connection,
    subject: &SubjectName,
) -> Result<Vec<Teacher>, error::TimetableError> {
    let mut stmt = conn.prepare(
        "SELECT id, teacher_name, subject, grades FROM teachers WHERE subject = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![subject], teacher_from_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn add_teacher(
    store: &Store,
    name: &str,
    subject: &SubjectName,
    grades: &GradeSet,
) -> Result<Teacher, error::TimetableError> {
    let id = store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.add_teacher", |conn| {
            insert_teacher(conn, name, subject, grades)
        })?;
    Ok(Teacher {
        id,
        name: name.trim().to_string(),
        subject: subject.clone(),
        grades: grades.clone(),
    })
}

pub fn add_subject(
    store: &Store,
    name: &SubjectName,
    grade: &Grade,
    periods_per_week: u32,
    sections: &[Section],
) -> Result<Subject, error::TimetableError> {
    let id = store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.add_subject", |conn| {
            insert_subject(conn, name, grade, periods_per_week, sections)
        })?;
    Ok(Subject {
        id,
        name: name.clone(),
        grade: grade.clone(),
        periods_per_week,
        sections: sections.to_vec(),
    })
}

/// Insert every row or none. Returns the new teacher ids in input order.
pub fn import_teachers(
    store: &Store,
    rows: &[TeacherImport],
) -> Result<Vec<i64>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.import_teachers", |conn| {
            let tx = conn.unchecked_transaction()?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let subject = SubjectName::new(&row.subject)?;
                let grades: GradeSet = row.grades.parse()?;
                ids.push(insert_teacher(&tx, &row.teacher_name, &subject, &grades)?);
            }
            tx.commit()?;
            Ok(ids)
        })
}

/// Insert every row or none, registering each subject's color. Returns the row count.
pub fn import_subjects(
    store: &Store,
    rows: &[SubjectImport],
) -> Result<usize, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.import_subjects", |conn| {
            let tx = conn.unchecked_transaction()?;
            for row in rows {
                let name = SubjectName::new(&row.subject_name)?;
                let grade = Grade::new(&row.grade)?;
                let sections = parse_sections(row.sections.as_deref().unwrap_or("A"));
                insert_subject(&tx, &name, &grade, row.periods_per_week, &sections)?;
            }
            tx.commit()?;
            Ok(rows.len())
        })
}

pub fn get_teacher(store: &Store, id: i64) -> Result<Option<Teacher>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.get_teacher", |conn| {
            load_teacher(conn, id)
        })
}

pub fn list_teachers(store: &Store) -> Result<Vec<Teacher>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.teachers", |conn| {
            let mut stmt =
                conn.prepare("SELECT id, teacher_name, subject, grades FROM teachers ORDER BY id")?;
            let rows = stmt.query_map([], teacher_from_row)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
}

pub fn list_subjects(store: &Store) -> Result<Vec<Subject>, error::TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "roster.subjects", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_name, grade, periods_per_week, sections FROM subjects ORDER BY id",
            )?;
            let rows = stmt.query_map([], subject_from_row)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
}

fn read_json_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, error::TimetableError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        error::TimetableError::ValidationError(format!("{}: {}", path.display(), e))
    })
}

pub fn run_roster_cli(store: &Store, cli: RosterCli) -> Result<(), error::TimetableError> {
    match cli.command {
        RosterCommand::AddTeacher {
            name,
            subject,
            grades,
        } => {
            let teacher = add_teacher(store, &name, &SubjectName::new(&subject)?, &grades.parse::<GradeSet>()?)?;
            println!(
                "{} teacher {} (ID: {})",
                "added".green().bold(),
                teacher.name,
                teacher.id
            );
        }
        RosterCommand::AddSubject {
            name,
            grade,
            periods_per_week,
            sections,
        } => {
            let subject = add_subject(
                store,
                &SubjectName::new(&name)?,
                &Grade::new(&grade)?,
                periods_per_week,
                &parse_sections(&sections),
            )?;
            println!(
                "{} subject {} for grade {}",
                "added".green().bold(),
                subject.name,
                subject.grade
            );
        }
        RosterCommand::Import { teachers, subjects } => {
            if teachers.is_none() && subjects.is_none() {
                return Err(error::TimetableError::ValidationError(
                    "nothing to import: pass --teachers and/or --subjects".to_string(),
                ));
            }
            // Subjects first so their colors exist before teachers reference them.
            if let Some(path) = subjects {
                let rows: Vec<SubjectImport> = read_json_rows(&path)?;
                let n = import_subjects(store, &rows)?;
                println!("{} {} subjects", "imported".green().bold(), n);
            }
            if let Some(path) = teachers {
                let rows: Vec<TeacherImport> = read_json_rows(&path)?;
                let ids = import_teachers(store, &rows)?;
                println!("{} {} teachers", "imported".green().bold(), ids.len());
            }
        }
        RosterCommand::Teachers => {
            let teachers = list_teachers(store)?;
            if teachers.is_empty() {
                println!("No teachers registered.");
            }
            for t in teachers {
                println!("{:>4}  {}  [{}]  grades {}", t.id, t.name, t.subject, t.grades);
            }
        }
        RosterCommand::Subjects => {
            let subjects = list_subjects(store)?;
            if subjects.is_empty() {
                println!("No subjects registered.");
            }
            for s in subjects {
                let sections = s
                    .sections
                    .iter()
                    .map(Section::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "grade {}  {}  {}/week  sections {}",
                    s.grade, s.name, s.periods_per_week, sections
                );
            }
        }
        RosterCommand::Colors => {
            for (name, color) in crate::plugins::queries::subject_colors(store)? {
                println!("{}  {}", color, name);
            }
        }
    }
    Ok(())
}
