//! Centralized table definitions for the timetable database.
//!
//! Everything lives in a single SQLite file (`timetable.db`):
//! 1. subject_colors: registry of subject names (and their display color).
//! 2. teachers / subjects: the roster, both keyed to subject_colors by name.
//! 3. teacher_busy_periods: committed (teacher, grade, section, period, day) records.
//! 4. settings: persisted key/value overrides.

pub const TIMETABLE_DB_NAME: &str = "timetable.db";
pub const TIMETABLE_EVENTS_NAME: &str = "timetable.events.jsonl";
pub const TIMETABLE_CONFIG_NAME: &str = "timetable.toml";

pub const SUBJECT_COLORS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS subject_colors (
        subject_name TEXT PRIMARY KEY,
        color_code TEXT NOT NULL
    )
";

pub const TEACHERS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS teachers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_name TEXT NOT NULL,
        subject TEXT NOT NULL,
        grades TEXT NOT NULL,
        FOREIGN KEY(subject) REFERENCES subject_colors(subject_name)
    )
";
pub const TEACHERS_SUBJECT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_teachers_subject ON teachers(subject)";

pub const SUBJECTS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_name TEXT NOT NULL,
        grade TEXT NOT NULL,
        periods_per_week INTEGER NOT NULL,
        sections TEXT NOT NULL,
        FOREIGN KEY(subject_name) REFERENCES subject_colors(subject_name)
    )
";
pub const SUBJECTS_GRADE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_subjects_grade ON subjects(grade)";

pub const BUSY_PERIODS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS teacher_busy_periods (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_id INTEGER NOT NULL,
        grade TEXT NOT NULL,
        section TEXT NOT NULL,
        period_number INTEGER NOT NULL,
        day_of_week TEXT NOT NULL,
        FOREIGN KEY(teacher_id) REFERENCES teachers(id)
    )
";
pub const BUSY_PERIODS_SLOT_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_busy_slot
    ON teacher_busy_periods(day_of_week, period_number, grade, section)";
pub const BUSY_PERIODS_TEACHER_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_busy_teacher
    ON teacher_busy_periods(teacher_id, day_of_week, period_number)";

pub const SETTINGS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
";
