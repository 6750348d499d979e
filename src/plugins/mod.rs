//! Timetable subsystems.
//!
//! - `roster`: teachers, subjects, subject-name registry and colors
//! - `assignments`: busy-period store and the manual-edit path
//! - `constraints`: conflict rules for a proposed assignment
//! - `coverage`: first-fit Games coverage
//! - `queries`: read-only lookups and the timetable projection

pub mod assignments;
pub mod constraints;
pub mod coverage;
pub mod queries;
pub mod roster;
