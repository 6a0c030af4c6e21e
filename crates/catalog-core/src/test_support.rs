//! In-memory repository and parser doubles for service tests.
//!
//! `MemoryCatalog` stages every unit-of-work write on a private copy of the
//! state and swaps it in on commit, with a writer lock serializing units.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::RepositoryError;
use catalog_types::page::{Page, PageRequest};
use catalog_types::workflow::{
    GenericInformation, Variable, Workflow, WorkflowId, WorkflowRevision,
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::parser::{DocumentParser, ParseError, ParsedDocument, XmlWorkflowParser};
use crate::repository::catalog::{AggregateWrite, CatalogRepository, RevisionUnitOfWork};

/// Row counts of everything a revision creation can write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    pub workflows: usize,
    pub revisions: usize,
    pub generic_information: usize,
    pub variables: usize,
}

#[derive(Debug, Clone, Default)]
struct State {
    buckets: Vec<Bucket>,
    workflows: Vec<Workflow>,
    revisions: Vec<WorkflowRevision>,
    generic_information: Vec<GenericInformation>,
    variables: Vec<Variable>,
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<State>>,
    writer: Arc<AsyncMutex<()>>,
    fail_workflow_writes: Arc<AtomicBool>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save_workflow` fail.
    pub fn fail_workflow_writes(&self, fail: bool) {
        self.fail_workflow_writes.store(fail, Ordering::SeqCst);
    }

    pub fn counts(&self) -> Counts {
        self.read(|s| Counts {
            workflows: s.workflows.len(),
            revisions: s.revisions.len(),
            generic_information: s.generic_information.len(),
            variables: s.variables.len(),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let guard = self.state.lock().unwrap();
        f(&guard)
    }
}

fn paginate(items: Vec<WorkflowRevision>, page: PageRequest) -> Page<WorkflowRevision> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect();
    Page::new(items, page, total)
}

impl CatalogRepository for MemoryCatalog {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, RepositoryError> {
        let writer = self.writer.clone().lock_owned().await;
        let staged = self.read(State::clone);
        Ok(MemoryUnitOfWork {
            shared: self.state.clone(),
            staged,
            fail_workflow_writes: self.fail_workflow_writes.load(Ordering::SeqCst),
            _writer: writer,
        })
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<(), RepositoryError> {
        let _writer = self.writer.lock().await;
        let mut state = self.state.lock().unwrap();
        if state.buckets.iter().any(|b| b.name == bucket.name) {
            return Err(RepositoryError::Conflict(format!("bucket name {}", bucket.name)));
        }
        state.buckets.push(bucket.clone());
        Ok(())
    }

    async fn find_bucket(&self, id: &BucketId) -> Result<Option<Bucket>, RepositoryError> {
        Ok(self.read(|s| s.buckets.iter().find(|b| b.id == *id).cloned()))
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, RepositoryError> {
        Ok(self.read(|s| s.buckets.clone()))
    }

    async fn find_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.read(|s| s.workflows.iter().find(|w| w.id == *id).cloned()))
    }

    async fn list_revisions(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        page: PageRequest,
    ) -> Result<Page<WorkflowRevision>, RepositoryError> {
        let mut revisions: Vec<WorkflowRevision> = self.read(|s| {
            s.revisions
                .iter()
                .filter(|r| r.bucket_id == *bucket_id && r.workflow_id == *workflow_id)
                .cloned()
                .collect()
        });
        revisions.sort_by_key(|r| r.revision_number);
        Ok(paginate(revisions, page))
    }

    async fn list_most_recent_revisions(
        &self,
        bucket_id: &BucketId,
        page: PageRequest,
    ) -> Result<Page<WorkflowRevision>, RepositoryError> {
        let revisions = self.read(|s| {
            s.workflows
                .iter()
                .filter(|w| w.bucket_id == *bucket_id)
                .filter_map(|w| {
                    s.revisions
                        .iter()
                        .find(|r| r.workflow_id == w.id && r.revision_number == w.last_revision_number)
                        .cloned()
                })
                .collect()
        });
        Ok(paginate(revisions, page))
    }

    async fn find_most_recent_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
    ) -> Result<Option<WorkflowRevision>, RepositoryError> {
        Ok(self.read(|s| {
            s.revisions
                .iter()
                .filter(|r| r.bucket_id == *bucket_id && r.workflow_id == *workflow_id)
                .max_by_key(|r| r.revision_number)
                .cloned()
        }))
    }

    async fn find_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        revision_number: i64,
    ) -> Result<Option<WorkflowRevision>, RepositoryError> {
        Ok(self.read(|s| {
            s.revisions
                .iter()
                .find(|r| {
                    r.bucket_id == *bucket_id
                        && r.workflow_id == *workflow_id
                        && r.revision_number == revision_number
                })
                .cloned()
        }))
    }
}

pub struct MemoryUnitOfWork {
    shared: Arc<Mutex<State>>,
    staged: State,
    fail_workflow_writes: bool,
    _writer: OwnedMutexGuard<()>,
}

impl RevisionUnitOfWork for MemoryUnitOfWork {
    async fn find_workflow(&mut self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.staged.workflows.iter().find(|w| w.id == *id).cloned())
    }

    async fn save_generic_information(
        &mut self,
        entries: &[GenericInformation],
    ) -> Result<(), RepositoryError> {
        self.staged.generic_information.extend_from_slice(entries);
        Ok(())
    }

    async fn save_variables(&mut self, entries: &[Variable]) -> Result<(), RepositoryError> {
        self.staged.variables.extend_from_slice(entries);
        Ok(())
    }

    async fn save_revision(&mut self, revision: &WorkflowRevision) -> Result<(), RepositoryError> {
        let duplicate = self.staged.revisions.iter().any(|r| {
            r.workflow_id == revision.workflow_id && r.revision_number == revision.revision_number
        });
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "revision {} already exists for workflow {}",
                revision.revision_number, revision.workflow_id
            )));
        }
        self.staged.revisions.push(revision.clone());
        Ok(())
    }

    async fn save_workflow(
        &mut self,
        workflow: &Workflow,
        write: AggregateWrite,
    ) -> Result<(), RepositoryError> {
        if self.fail_workflow_writes {
            return Err(RepositoryError::Query("injected workflow write failure".to_string()));
        }
        let position = self.staged.workflows.iter().position(|w| w.id == workflow.id);
        match (write, position) {
            (AggregateWrite::Create, None) => {
                self.staged.workflows.push(workflow.clone());
                Ok(())
            }
            (AggregateWrite::Append { expected_last_revision }, Some(i))
                if self.staged.workflows[i].last_revision_number == expected_last_revision =>
            {
                self.staged.workflows[i] = workflow.clone();
                Ok(())
            }
            _ => Err(RepositoryError::Conflict(format!(
                "workflow {} changed concurrently",
                workflow.id
            ))),
        }
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        *self.shared.lock().unwrap() = self.staged;
        Ok(())
    }
}

/// Parser wrapper that counts invocations.
#[derive(Clone, Default)]
pub struct CountingParser {
    inner: XmlWorkflowParser,
    calls: Arc<AtomicUsize>,
}

impl CountingParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentParser for CountingParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(bytes)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A minimal job descriptor with the given names and job-level entries.
pub fn job_xml(
    project: &str,
    job: &str,
    generic_information: &[(&str, &str)],
    variables: &[(&str, &str)],
) -> Vec<u8> {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<job xmlns=\"urn:proactive:jobdescriptor:3.3\" name=\"{}\" projectName=\"{}\">\n",
        escape(job),
        escape(project)
    );
    if !variables.is_empty() {
        xml.push_str("  <variables>\n");
        for (k, v) in variables {
            xml.push_str(&format!(
                "    <variable name=\"{}\" value=\"{}\"/>\n",
                escape(k),
                escape(v)
            ));
        }
        xml.push_str("  </variables>\n");
    }
    if !generic_information.is_empty() {
        xml.push_str("  <genericInformation>\n");
        for (k, v) in generic_information {
            xml.push_str(&format!(
                "    <info name=\"{}\" value=\"{}\"/>\n",
                escape(k),
                escape(v)
            ));
        }
        xml.push_str("  </genericInformation>\n");
    }
    xml.push_str("  <taskFlow>\n    <task name=\"t1\"/>\n  </taskFlow>\n</job>\n");
    xml.into_bytes()
}
