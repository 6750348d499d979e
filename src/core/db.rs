use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::TimetableError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::TimetableError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::TimetableError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::TimetableError::RusqliteError)?;
    Ok(conn)
}

pub fn timetable_db_path(root: &Path) -> PathBuf {
    root.join(schemas::TIMETABLE_DB_NAME)
}

// Subsystems own their tables and create them from `subsystems::initialize_all_dbs`.
// Everything shares the one file so the busy-period joins stay plain SQL.
