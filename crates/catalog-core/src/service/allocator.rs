//! Revision number allocation.

use catalog_types::workflow::Workflow;

/// Revision number for the next revision of `existing`.
///
/// A workflow that does not exist yet starts at 1.
pub fn next_revision_number(existing: Option<&Workflow>) -> i64 {
    match existing {
        Some(workflow) => workflow.last_revision_number + 1,
        None => 1,
    }
}
