//! Subsystem registration: every table initializer in one place.
//!
//! Adding a new subsystem: append one entry to `SUBSYSTEMS`.

use crate::core::{config, error};
use crate::plugins::{assignments, roster};
use std::fs;
use std::path::Path;

pub(crate) struct SubsystemInit {
    pub name: &'static str,
    pub initialize_db: fn(&Path) -> Result<(), error::TimetableError>,
}

/// Order matters: roster tables must exist before busy periods reference them.
pub(crate) const SUBSYSTEMS: &[SubsystemInit] = &[
    SubsystemInit { name: "roster", initialize_db: roster::initialize_roster_db },
    SubsystemInit { name: "assignments", initialize_db: assignments::initialize_assignments_db },
    SubsystemInit { name: "settings", initialize_db: config::initialize_settings_db },
];

/// Create the data directory and every subsystem's tables. Idempotent.
pub fn initialize_all_dbs(data_root: &Path) -> Result<(), error::TimetableError> {
    fs::create_dir_all(data_root).map_err(|e| {
        error::TimetableError::DatabaseInitializationError(format!(
            "{}: {}",
            data_root.display(),
            e
        ))
    })?;
    for sub in SUBSYSTEMS {
        (sub.initialize_db)(data_root).map_err(|e| {
            error::TimetableError::DatabaseInitializationError(format!("{}: {}", sub.name, e))
        })?;
    }
    Ok(())
}
