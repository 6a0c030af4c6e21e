use thiserror::Error;

/// Domain errors surfaced by the catalog services.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("bucket not found")]
    BucketNotFound,

    #[error("workflow not found")]
    WorkflowNotFound,

    #[error("revision not found")]
    RevisionNotFound,

    #[error("unprocessable document: {0}")]
    UnprocessableDocument(String),

    #[error("bucket '{0}' already exists")]
    BucketConflict(String),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from repository operations (used by trait definitions in catalog-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
