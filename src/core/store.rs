//! Store handle for the timetable workspace.
//!
//! A store is the data directory holding `timetable.db`, the broker audit log,
//! and the optional `timetable.toml` configuration file.

use crate::core::broker::DbBroker;
use crate::core::db;
use std::path::PathBuf;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".timetable";

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "TIMETABLE_HOME";

#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or caller-relative path to the data directory.
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn db_path(&self) -> PathBuf {
        db::timetable_db_path(&self.root)
    }

    pub fn broker(&self) -> DbBroker {
        DbBroker::new(&self.root)
    }
}
