//! Catalog repository trait definitions.
//!
//! Reads go straight through [`CatalogRepository`]. Revision creation goes
//! through a [`RevisionUnitOfWork`]: every write made on it becomes visible
//! together on [`RevisionUnitOfWork::commit`], and dropping it uncommitted
//! discards them all.

use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::RepositoryError;
use catalog_types::page::{Page, PageRequest};
use catalog_types::workflow::{
    GenericInformation, Variable, Workflow, WorkflowId, WorkflowRevision,
};

/// How a workflow aggregate is written at the end of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateWrite {
    /// The workflow did not exist before this unit of work.
    Create,
    /// The workflow existed with this `last_revision_number` when it was read.
    /// The write must fail with `RepositoryError::Conflict` if the stored
    /// value has moved since.
    Append { expected_last_revision: i64 },
}

/// Repository trait for catalog persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait CatalogRepository: Send + Sync {
    type UnitOfWork: RevisionUnitOfWork;

    /// Start an atomic write scope for one revision creation.
    fn begin(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::UnitOfWork, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Insert a bucket. A duplicate name is a `Conflict`.
    fn create_bucket(
        &self,
        bucket: &Bucket,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_bucket(
        &self,
        id: &BucketId,
    ) -> impl std::future::Future<Output = Result<Option<Bucket>, RepositoryError>> + Send;

    /// All buckets, oldest first.
    fn list_buckets(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Bucket>, RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Workflows and revisions
    // -----------------------------------------------------------------------

    fn find_workflow(
        &self,
        id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, RepositoryError>> + Send;

    /// Revisions of one workflow in the given bucket, ordered by revision number.
    fn list_revisions(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<WorkflowRevision>, RepositoryError>> + Send;

    /// The latest revision of every workflow in a bucket, ordered by
    /// workflow creation.
    fn list_most_recent_revisions(
        &self,
        bucket_id: &BucketId,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<WorkflowRevision>, RepositoryError>> + Send;

    fn find_most_recent_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowRevision>, RepositoryError>> + Send;

    fn find_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        revision_number: i64,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowRevision>, RepositoryError>> + Send;
}

/// An open atomic write scope.
///
/// Implementations must serialize units of work that touch the same
/// workflow, or at least guarantee that [`AggregateWrite::Append`] detects a
/// concurrent advance of `last_revision_number`.
pub trait RevisionUnitOfWork: Send {
    /// Read a workflow as seen by this unit of work.
    fn find_workflow(
        &mut self,
        id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<Workflow>, RepositoryError>> + Send;

    /// Store generic information records, keeping their order.
    fn save_generic_information(
        &mut self,
        entries: &[GenericInformation],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store variable records, keeping their order.
    fn save_variables(
        &mut self,
        entries: &[Variable],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store a revision and link it to its (already saved) metadata records.
    fn save_revision(
        &mut self,
        revision: &WorkflowRevision,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Locked compare-and-append of the workflow aggregate.
    fn save_workflow(
        &mut self,
        workflow: &Workflow,
        write: AggregateWrite,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Make every write of this unit visible at once.
    fn commit(self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
