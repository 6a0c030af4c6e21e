//! Infrastructure layer for the workflow catalog.
//!
//! Contains the SQLite implementation of the repository traits defined in
//! `catalog-core`, plus configuration loading and data directory resolution.

pub mod config;
pub mod sqlite;
