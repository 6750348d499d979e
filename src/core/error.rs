use crate::plugins::constraints::Conflict;
use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to initialize database: {0}")]
    DatabaseInitializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Rejected assignment; the message is meant to be shown to the operator as-is.
    #[error("{0}")]
    Conflict(#[from] Conflict),
}
