//! Workflow catalog domain types.
//!
//! A `Workflow` is an aggregate that only tracks its latest revision number;
//! the revisions themselves are stored separately and addressed by
//! `(workflow_id, revision_number)`. Revisions, generic information entries
//! and variables are immutable once persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bucket::{Bucket, BucketId};

use std::fmt;
use std::str::FromStr;

/// Media type of the raw documents held by the catalog.
pub const XML_MEDIA_TYPE: &str = "application/xml";

/// Unique identifier for a workflow, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    /// Create a new WorkflowId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a WorkflowId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkflowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Metadata records
// ---------------------------------------------------------------------------

/// A job-level generic information entry, persisted as its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericInformation {
    pub id: Uuid,
    pub key: String,
    pub value: String,
}

impl GenericInformation {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A job-level variable entry, persisted as its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: Uuid,
    pub key: String,
    pub value: String,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            key: key.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Revision and aggregate
// ---------------------------------------------------------------------------

/// An immutable snapshot of a workflow document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRevision {
    pub id: Uuid,
    pub workflow_id: WorkflowId,
    pub bucket_id: BucketId,
    /// Starts at 1 and grows by one per revision of the same workflow.
    pub revision_number: i64,
    /// Job name extracted from the document.
    pub name: String,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub generic_information: Vec<GenericInformation>,
    pub variables: Vec<Variable>,
    /// The submitted document, byte for byte.
    pub xml_payload: Vec<u8>,
}

/// Aggregate root for a named workflow inside a bucket.
///
/// Holds no revision data of its own, only the number of the latest one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub bucket_id: BucketId,
    pub last_revision_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create the aggregate owning `first` inside `bucket`.
    pub fn new(bucket: &Bucket, first: &WorkflowRevision) -> Self {
        Self {
            id: first.workflow_id,
            bucket_id: bucket.id,
            last_revision_number: first.revision_number,
            created_at: first.created_at,
            updated_at: first.created_at,
        }
    }

    /// Append `revision` to this workflow's history.
    pub fn add_revision(&mut self, revision: &WorkflowRevision) {
        debug_assert_eq!(revision.workflow_id, self.id);
        debug_assert_eq!(revision.revision_number, self.last_revision_number + 1);
        self.last_revision_number = revision.revision_number;
        self.updated_at = revision.created_at;
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// A plain key/value pair as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Metadata view of a revision; never carries the raw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub bucket_id: BucketId,
    pub workflow_id: WorkflowId,
    pub revision_number: i64,
    pub name: String,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub generic_information: Vec<KeyValue>,
    pub variables: Vec<KeyValue>,
}

impl From<&WorkflowRevision> for WorkflowMetadata {
    fn from(revision: &WorkflowRevision) -> Self {
        Self {
            bucket_id: revision.bucket_id,
            workflow_id: revision.workflow_id,
            revision_number: revision.revision_number,
            name: revision.name.clone(),
            project_name: revision.project_name.clone(),
            created_at: revision.created_at,
            generic_information: revision
                .generic_information
                .iter()
                .map(|gi| KeyValue {
                    key: gi.key.clone(),
                    value: gi.value.clone(),
                })
                .collect(),
            variables: revision
                .variables
                .iter()
                .map(|v| KeyValue {
                    key: v.key.clone(),
                    value: v.value.clone(),
                })
                .collect(),
        }
    }
}

/// The original document of a revision, ready to be served as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub content_length: usize,
    pub media_type: &'static str,
}

impl From<WorkflowRevision> for RawDocument {
    fn from(revision: WorkflowRevision) -> Self {
        let content_length = revision.xml_payload.len();
        Self {
            bytes: revision.xml_payload,
            content_length,
            media_type: XML_MEDIA_TYPE,
        }
    }
}

/// Result of fetching a single revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionView {
    Metadata(WorkflowMetadata),
    Raw(RawDocument),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_revision(workflow_id: WorkflowId, bucket_id: BucketId, number: i64) -> WorkflowRevision {
        WorkflowRevision {
            id: Uuid::now_v7(),
            workflow_id,
            bucket_id,
            revision_number: number,
            name: "job".to_string(),
            project_name: "project".to_string(),
            created_at: Utc::now(),
            generic_information: vec![GenericInformation::new("a", "1")],
            variables: vec![Variable::new("x", "y")],
            xml_payload: b"<job/>".to_vec(),
        }
    }

    #[test]
    fn test_new_workflow_tracks_first_revision() {
        let bucket = Bucket::new("b");
        let rev = make_revision(WorkflowId::new(), bucket.id, 1);
        let wf = Workflow::new(&bucket, &rev);
        assert_eq!(wf.id, rev.workflow_id);
        assert_eq!(wf.bucket_id, bucket.id);
        assert_eq!(wf.last_revision_number, 1);
    }

    #[test]
    fn test_add_revision_advances_last_number() {
        let bucket = Bucket::new("b");
        let first = make_revision(WorkflowId::new(), bucket.id, 1);
        let mut wf = Workflow::new(&bucket, &first);

        let second = make_revision(wf.id, bucket.id, 2);
        wf.add_revision(&second);

        assert_eq!(wf.last_revision_number, 2);
        assert_eq!(wf.updated_at, second.created_at);
        assert_eq!(wf.created_at, first.created_at);
    }

    #[test]
    fn test_metadata_projection_drops_payload_and_ids() {
        let rev = make_revision(WorkflowId::new(), BucketId::new(), 3);
        let meta = WorkflowMetadata::from(&rev);
        assert_eq!(meta.revision_number, 3);
        assert_eq!(
            meta.generic_information,
            vec![KeyValue { key: "a".into(), value: "1".into() }]
        );
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("xml_payload").is_none());
        assert_eq!(json["variables"][0]["key"], "x");
    }

    #[test]
    fn test_raw_document_keeps_exact_bytes() {
        let rev = make_revision(WorkflowId::new(), BucketId::new(), 1);
        let raw = RawDocument::from(rev);
        assert_eq!(raw.bytes, b"<job/>");
        assert_eq!(raw.content_length, 6);
        assert_eq!(raw.media_type, "application/xml");
    }
}
