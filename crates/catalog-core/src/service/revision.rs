//! Revision creation.
//!
//! Parses an incoming document, checks the metadata the catalog requires,
//! and stores the revision, its metadata records and the workflow aggregate
//! in a single unit of work.

use catalog_types::bucket::BucketId;
use catalog_types::error::CatalogError;
use catalog_types::workflow::{Workflow, WorkflowId, WorkflowMetadata, WorkflowRevision};
use chrono::Utc;
use uuid::Uuid;

use crate::parser::DocumentParser;
use crate::repository::catalog::{AggregateWrite, CatalogRepository, RevisionUnitOfWork};
use crate::service::allocator::next_revision_number;
use crate::service::metadata::{persist_generic_information, persist_variables};

fn missing_element(message: &str) -> CatalogError {
    CatalogError::UnprocessableDocument(format!(
        "XML does not validate against Schema. {message}"
    ))
}

/// Creates workflow revisions.
///
/// Generic over the repository and the document parser so the orchestration
/// can be exercised without a database or a real XML document.
pub struct RevisionService<R: CatalogRepository, P: DocumentParser> {
    repo: R,
    parser: P,
}

impl<R: CatalogRepository, P: DocumentParser> RevisionService<R, P> {
    pub fn new(repo: R, parser: P) -> Self {
        Self { repo, parser }
    }

    /// Store `xml_payload` as a new revision.
    ///
    /// Without `workflow_id` a new workflow is created at revision 1;
    /// otherwise the revision is appended to that workflow. Nothing is
    /// written unless every step succeeds.
    #[tracing::instrument(
        name = "create_revision",
        skip_all,
        fields(
            bucket_id = %bucket_id,
            workflow_id = ?workflow_id,
            bytes = xml_payload.len(),
        )
    )]
    pub async fn create_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: Option<&WorkflowId>,
        xml_payload: Vec<u8>,
    ) -> Result<WorkflowMetadata, CatalogError> {
        let bucket = self
            .repo
            .find_bucket(bucket_id)
            .await?
            .ok_or(CatalogError::BucketNotFound)?;

        let parsed = self
            .parser
            .parse(&xml_payload)
            .map_err(|e| CatalogError::UnprocessableDocument(e.to_string()))?;

        let project_name = parsed
            .project_name
            .clone()
            .ok_or_else(|| missing_element("No project name defined."))?;
        let name = parsed
            .job_name
            .clone()
            .ok_or_else(|| missing_element("No job name defined."))?;

        let mut uow = self.repo.begin().await?;

        let generic_information =
            persist_generic_information(&mut uow, &parsed.generic_information).await?;
        let variables = persist_variables(&mut uow, &parsed.variables).await?;

        let existing = match workflow_id {
            Some(id) => Some(
                uow.find_workflow(id)
                    .await?
                    .filter(|wf| wf.bucket_id == bucket.id)
                    .ok_or(CatalogError::WorkflowNotFound)?,
            ),
            None => None,
        };

        let revision = WorkflowRevision {
            id: Uuid::now_v7(),
            workflow_id: existing.as_ref().map(|wf| wf.id).unwrap_or_default(),
            bucket_id: bucket.id,
            revision_number: next_revision_number(existing.as_ref()),
            name,
            project_name,
            created_at: Utc::now(),
            generic_information,
            variables,
            xml_payload,
        };
        uow.save_revision(&revision).await?;

        let (workflow, write) = match existing {
            None => (Workflow::new(&bucket, &revision), AggregateWrite::Create),
            Some(mut workflow) => {
                let expected_last_revision = workflow.last_revision_number;
                workflow.add_revision(&revision);
                (
                    workflow,
                    AggregateWrite::Append {
                        expected_last_revision,
                    },
                )
            }
        };
        uow.save_workflow(&workflow, write).await?;

        uow.commit().await?;

        tracing::info!(
            workflow_id = %revision.workflow_id,
            revision = revision.revision_number,
            "stored workflow revision"
        );

        Ok(WorkflowMetadata::from(&revision))
    }
}
