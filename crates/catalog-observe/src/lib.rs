//! Observability setup for the workflow catalog: tracing subscriber
//! initialization with optional OpenTelemetry export.

pub mod tracing_setup;
