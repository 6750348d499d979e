use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ulid::Ulid;

/// The DB Broker is the single path to the timetable database.
///
/// Every call opens a fresh connection, serializes against other in-process
/// callers, and appends one line to the audit log once the closure returns.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(schemas::TIMETABLE_EVENTS_NAME),
        }
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Execute a closure with a serialized connection to the specified DB.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::TimetableError>
    where
        F: FnOnce(&Connection) -> Result<R, error::TimetableError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        // A panic inside another closure leaves nothing half-written that the lock protects.
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let conn = db::db_connect(&db_path.to_string_lossy())?;

        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::TimetableError> {
        let ev = BrokerEvent {
            ts: now_epoch_z(),
            event_id: new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let line = serde_json::to_string(&ev)
            .map_err(|e| error::TimetableError::ValidationError(e.to_string()))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::TimetableError::IoError)?;

        writeln!(f, "{}", line).map_err(error::TimetableError::IoError)?;
        Ok(())
    }

    /// Read back the audit log, oldest first. A missing log is an empty history.
    pub fn read_events(&self) -> Result<Vec<BrokerEvent>, error::TimetableError> {
        if !self.audit_log_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.audit_log_path)?;
        let mut events = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let ev: BrokerEvent = serde_json::from_str(line).map_err(|e| {
                error::TimetableError::ValidationError(format!("corrupt audit line: {}", e))
            })?;
            events.push(ev);
        }
        Ok(events)
    }
}
