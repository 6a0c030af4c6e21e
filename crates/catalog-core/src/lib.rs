//! Business logic and repository trait definitions for the workflow catalog.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, the workflow document parser, and the services that
//! create and read revisions. It depends only on `catalog-types` -- never on
//! `catalog-infra` or any database/IO crate.

pub mod parser;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
