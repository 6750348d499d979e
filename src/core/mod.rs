//! Shared primitives: store handle, broker, schemas, configuration and domain types.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod output;
pub mod schemas;
pub mod store;
