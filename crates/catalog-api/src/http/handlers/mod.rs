//! REST API request handlers.

pub mod bucket;
pub mod health;
pub mod workflow;
