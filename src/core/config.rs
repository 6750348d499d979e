//! Configuration: `timetable.toml` plus persisted overrides from the `settings` table.
//!
//! The file is optional; every field has a default. `Settings::resolve` runs once
//! per process and the resulting value is handed to each operation explicitly.

use crate::core::error::TimetableError;
use crate::core::model::{SubjectName, Weekday};
use crate::core::schemas;
use crate::core::store::Store;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const PERIODS_PER_DAY_KEY: &str = "periods_per_day";
pub const DEFAULT_PERIODS_PER_DAY: u32 = 8;
pub const MAX_PERIODS_PER_DAY: u32 = 12;
pub const DEFAULT_MANDATORY_SUBJECT: &str = "Games";
pub const DEFAULT_FALLBACK_TEACHER: &str = "Games Teacher";
pub const DEFAULT_MAX_DAILY_PER_SUBJECT: u32 = 2;

fn default_periods_per_day() -> u32 {
    DEFAULT_PERIODS_PER_DAY
}

fn default_weekdays() -> Vec<Weekday> {
    Weekday::ALL[..5].to_vec()
}

fn default_mandatory_subject() -> String {
    DEFAULT_MANDATORY_SUBJECT.to_string()
}

fn default_fallback_teacher() -> String {
    DEFAULT_FALLBACK_TEACHER.to_string()
}

fn default_max_daily() -> u32 {
    DEFAULT_MAX_DAILY_PER_SUBJECT
}

/// On-disk shape of `timetable.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TimetableConfig {
    #[serde(default = "default_periods_per_day")]
    pub periods_per_day: u32,
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<Weekday>,
    #[serde(default = "default_mandatory_subject")]
    pub mandatory_subject: String,
    #[serde(default = "default_fallback_teacher")]
    pub fallback_teacher_name: String,
    #[serde(default = "default_max_daily")]
    pub max_daily_per_subject: u32,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            periods_per_day: default_periods_per_day(),
            weekdays: default_weekdays(),
            mandatory_subject: default_mandatory_subject(),
            fallback_teacher_name: default_fallback_teacher(),
            max_daily_per_subject: default_max_daily(),
        }
    }
}

/// Load `timetable.toml` from the data directory. No file means defaults.
pub fn load_config(root: &Path) -> Result<TimetableConfig, TimetableError> {
    let config_path = root.join(schemas::TIMETABLE_CONFIG_NAME);
    if !config_path.exists() {
        return Ok(TimetableConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(TimetableError::IoError)?;
    toml::from_str(&content).map_err(|e| {
        TimetableError::ConfigError(format!("{}: {}", config_path.display(), e))
    })
}

/// Resolved, validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub periods_per_day: u32,
    pub weekdays: Vec<Weekday>,
    pub mandatory_subject: SubjectName,
    pub fallback_teacher_name: String,
    pub max_daily_per_subject: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            periods_per_day: DEFAULT_PERIODS_PER_DAY,
            weekdays: default_weekdays(),
            mandatory_subject: SubjectName(DEFAULT_MANDATORY_SUBJECT.to_string()),
            fallback_teacher_name: DEFAULT_FALLBACK_TEACHER.to_string(),
            max_daily_per_subject: DEFAULT_MAX_DAILY_PER_SUBJECT,
        }
    }
}

impl Settings {
    pub fn from_config(config: TimetableConfig) -> Result<Self, TimetableError> {
        validate_periods_per_day(config.periods_per_day)?;

        let mut seen = HashSet::new();
        if config.weekdays.iter().any(|d| !seen.insert(*d)) {
            return Err(TimetableError::ConfigError(
                "weekdays must not repeat".to_string(),
            ));
        }
        if !(5..=6).contains(&config.weekdays.len()) {
            return Err(TimetableError::ConfigError(format!(
                "weekdays must list 5 or 6 days, got {}",
                config.weekdays.len()
            )));
        }
        if config.max_daily_per_subject == 0 {
            return Err(TimetableError::ConfigError(
                "max_daily_per_subject must be at least 1".to_string(),
            ));
        }
        let fallback = config.fallback_teacher_name.trim();
        if fallback.is_empty() {
            return Err(TimetableError::ConfigError(
                "fallback_teacher_name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            periods_per_day: config.periods_per_day,
            weekdays: config.weekdays,
            mandatory_subject: SubjectName::new(&config.mandatory_subject)
                .map_err(|e| TimetableError::ConfigError(e.to_string()))?,
            fallback_teacher_name: fallback.to_string(),
            max_daily_per_subject: config.max_daily_per_subject,
        })
    }

    /// Config file first, then the persisted `periods_per_day` override.
    pub fn resolve(store: &Store) -> Result<Self, TimetableError> {
        let mut config = load_config(&store.root)?;
        if store.db_path().exists() {
            if let Some(ppd) = get_setting(store, PERIODS_PER_DAY_KEY)? {
                config.periods_per_day = u32::try_from(ppd).map_err(|_| {
                    TimetableError::ConfigError(format!("stored periods_per_day {} out of range", ppd))
                })?;
            }
        }
        Self::from_config(config)
    }

    pub fn periods(&self) -> impl Iterator<Item = u32> {
        1..=self.periods_per_day
    }

    /// Position of a day in the configured week, or `None` if it is not a school day.
    pub fn day_index(&self, day: Weekday) -> Option<usize> {
        self.weekdays.iter().position(|d| *d == day)
    }

    /// Reject days outside the configured week and periods outside `1..=periods_per_day`.
    pub fn validate_slot(&self, day: Weekday, period: u32) -> Result<(), TimetableError> {
        if self.day_index(day).is_none() {
            return Err(TimetableError::ValidationError(format!(
                "{} is not a school day",
                day
            )));
        }
        if period == 0 || period > self.periods_per_day {
            return Err(TimetableError::ValidationError(format!(
                "period {} outside 1..={}",
                period, self.periods_per_day
            )));
        }
        Ok(())
    }
}

pub fn validate_periods_per_day(value: u32) -> Result<(), TimetableError> {
    if value == 0 || value > MAX_PERIODS_PER_DAY {
        return Err(TimetableError::ConfigError(format!(
            "periods_per_day must be within 1..={}, got {}",
            MAX_PERIODS_PER_DAY, value
        )));
    }
    Ok(())
}

pub fn initialize_settings_db(root: &Path) -> Result<(), TimetableError> {
    let store = Store::new(root);
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "settings.init", |conn| {
            conn.execute(schemas::SETTINGS_SCHEMA, [])?;
            Ok(())
        })
}

fn read_setting(conn: &Connection, key: &str) -> Result<Option<i64>, TimetableError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|v| {
        v.trim().parse::<i64>().map_err(|_| {
            TimetableError::ConfigError(format!("setting '{}' is not an integer: '{}'", key, v))
        })
    })
    .transpose()
}

/// Persisted integer setting, `None` when absent.
pub fn get_setting(store: &Store, key: &str) -> Result<Option<i64>, TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "settings.get", |conn| {
            read_setting(conn, key)
        })
}

pub fn set_setting(store: &Store, key: &str, value: i64) -> Result<(), TimetableError> {
    store
        .broker()
        .with_conn(&store.db_path(), "timetable", "settings.set", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings(key, value) VALUES(?1, ?2)",
                params![key, value.to_string()],
            )?;
            Ok(())
        })
}

pub fn set_periods_per_day(store: &Store, value: u32) -> Result<(), TimetableError> {
    validate_periods_per_day(value)?;
    set_setting(store, PERIODS_PER_DAY_KEY, i64::from(value))
}
