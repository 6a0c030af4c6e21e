//! Read paths over stored revisions.

use catalog_types::bucket::BucketId;
use catalog_types::config::PaginationConfig;
use catalog_types::error::CatalogError;
use catalog_types::page::{Page, PageRequest};
use catalog_types::workflow::{RawDocument, RevisionView, WorkflowId, WorkflowMetadata};

use crate::repository::catalog::CatalogRepository;

/// Lists revisions and serves single revisions as metadata or raw bytes.
pub struct CatalogQueryService<R: CatalogRepository> {
    repo: R,
    paging: PaginationConfig,
}

impl<R: CatalogRepository> CatalogQueryService<R> {
    pub fn new(repo: R, paging: PaginationConfig) -> Self {
        Self { repo, paging }
    }

    async fn require_bucket(&self, bucket_id: &BucketId) -> Result<(), CatalogError> {
        self.repo
            .find_bucket(bucket_id)
            .await?
            .map(|_| ())
            .ok_or(CatalogError::BucketNotFound)
    }

    /// Page through the revisions of `workflow_id`, or through the latest
    /// revision of every workflow in the bucket when no workflow is given.
    pub async fn list_revisions(
        &self,
        bucket_id: &BucketId,
        workflow_id: Option<&WorkflowId>,
        page: PageRequest,
    ) -> Result<Page<WorkflowMetadata>, CatalogError> {
        self.require_bucket(bucket_id).await?;
        let page = page.clamped(self.paging.default_limit, self.paging.max_limit);

        let revisions = match workflow_id {
            Some(id) => self.repo.list_revisions(bucket_id, id, page).await?,
            None => self.repo.list_most_recent_revisions(bucket_id, page).await?,
        };

        tracing::debug!(
            bucket_id = %bucket_id,
            returned = revisions.items.len(),
            total = revisions.total,
            "listed revisions"
        );

        Ok(revisions.map(|r| WorkflowMetadata::from(&r)))
    }

    /// Fetch one revision: the latest when `revision_number` is `None`,
    /// otherwise that exact revision.
    pub async fn get_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        revision_number: Option<i64>,
        raw: bool,
    ) -> Result<RevisionView, CatalogError> {
        self.require_bucket(bucket_id).await?;
        self.repo
            .find_workflow(workflow_id)
            .await?
            .ok_or(CatalogError::WorkflowNotFound)?;

        let revision = match revision_number {
            Some(number) => {
                self.repo
                    .find_revision(bucket_id, workflow_id, number)
                    .await?
            }
            None => {
                self.repo
                    .find_most_recent_revision(bucket_id, workflow_id)
                    .await?
            }
        }
        .ok_or(CatalogError::RevisionNotFound)?;

        if raw {
            Ok(RevisionView::Raw(RawDocument::from(revision)))
        } else {
            Ok(RevisionView::Metadata(WorkflowMetadata::from(&revision)))
        }
    }
}
