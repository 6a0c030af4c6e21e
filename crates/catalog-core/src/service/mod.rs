//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and catalog rules. They depend on
//! traits (ports) -- never on concrete infrastructure implementations.

pub mod allocator;
pub mod bucket;
pub mod metadata;
pub mod query;
pub mod revision;
