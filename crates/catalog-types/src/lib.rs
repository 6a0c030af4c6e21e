//! Shared domain types for the workflow catalog.
//!
//! Buckets, workflows, revisions and their metadata records, the paging
//! primitives, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod bucket;
pub mod config;
pub mod error;
pub mod page;
pub mod workflow;
