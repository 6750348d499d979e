//! Domain vocabulary shared by every subsystem.
//!
//! Grades, sections and subject names are plain strings in the database but
//! distinct types here, so a grade can never be passed where a section is
//! expected. `GradeSet` replaces the delimited "grades" string of the roster
//! with real set membership: "1" is not a member of {"10"}.

use crate::core::error::TimetableError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = TimetableError;

    /// Accepts full names and three-letter abbreviations, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| {
                let name = d.as_str().to_ascii_lowercase();
                name == needle || (needle.len() == 3 && name.starts_with(&needle))
            })
            .ok_or_else(|| TimetableError::ValidationError(format!("Unknown weekday: '{}'", s)))
    }
}

impl ToSql for Weekday {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Weekday {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident, $what:literal, reserved = [$($reserved:literal),*]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Trims the input; empty values and list delimiters are rejected.
            pub fn new(value: impl AsRef<str>) -> Result<Self, TimetableError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(TimetableError::ValidationError(format!(
                        "{} must not be empty",
                        $what
                    )));
                }
                const RESERVED: &[char] = &[$($reserved),*];
                if let Some(c) = trimmed.chars().find(|c| RESERVED.contains(c)) {
                    return Err(TimetableError::ValidationError(format!(
                        "{} '{}' must not contain '{}'",
                        $what, trimmed, c
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = TimetableError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TimetableError;
            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                Ok(Self(value.as_str()?.to_string()))
            }
        }
    };
}

string_key!(
    /// A grade identifier such as `"5"` or `"KG"`.
    Grade,
    "grade",
    reserved = [',', ';', '|']
);
string_key!(
    /// A section within a grade, e.g. `"A"`.
    Section,
    "section",
    reserved = [',']
);
string_key!(
    /// Subject name. Unique across the whole school; the join key between
    /// teachers, subjects and subject colors.
    SubjectName,
    "subject name",
    reserved = []
);

fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';', '|'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The grades a teacher may teach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSet(BTreeSet<Grade>);

impl GradeSet {
    pub fn single(grade: Grade) -> Self {
        Self(BTreeSet::from([grade]))
    }

    pub fn contains(&self, grade: &Grade) -> bool {
        self.0.contains(grade)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Storage form: grades joined with `,`.
    pub fn to_stored(&self) -> String {
        self.0
            .iter()
            .map(Grade::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for GradeSet {
    type Err = TimetableError;

    /// Parses a delimited list (`,` `;` or `|`). Grades may contain spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let grades = split_tokens(s)
            .map(Grade::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self(grades))
    }
}

impl fmt::Display for GradeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_stored())
    }
}

impl FromSql for GradeSet {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: TimetableError| FromSqlError::Other(Box::new(e)))
    }
}

/// Parses a comma-delimited section list, keeping input order and dropping blanks.
pub fn parse_sections(raw: &str) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::new();
    for token in raw.split(',') {
        if let Ok(section) = Section::new(token) {
            if !out.contains(&section) {
                out.push(section);
            }
        }
    }
    out
}

/// A (day, period, grade, section) coordinate in the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub day: Weekday,
    pub period: u32,
    pub grade: Grade,
    pub section: Section,
}

impl Slot {
    pub fn new(day: Weekday, period: u32, grade: Grade, section: Section) -> Self {
        Self {
            day,
            period,
            grade,
            section,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} period {} grade {} section {}",
            self.day, self.period, self.grade, self.section
        )
    }
}
