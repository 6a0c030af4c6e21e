//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use catalog_types::error::{CatalogError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Catalog domain and storage errors.
    Catalog(CatalogError),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Catalog(e)
    }
}

impl AppError {
    /// Status, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Catalog(CatalogError::BucketNotFound) => {
                (StatusCode::NOT_FOUND, "BUCKET_NOT_FOUND", "Bucket not found".to_string())
            }
            AppError::Catalog(CatalogError::WorkflowNotFound) => {
                (StatusCode::NOT_FOUND, "WORKFLOW_NOT_FOUND", "Workflow not found".to_string())
            }
            AppError::Catalog(CatalogError::RevisionNotFound) => {
                (StatusCode::NOT_FOUND, "REVISION_NOT_FOUND", "Revision not found".to_string())
            }
            AppError::Catalog(CatalogError::UnprocessableDocument(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_DOCUMENT", msg.clone())
            }
            AppError::Catalog(e @ CatalogError::BucketConflict(_)) => {
                (StatusCode::CONFLICT, "BUCKET_CONFLICT", e.to_string())
            }
            AppError::Catalog(e @ CatalogError::InvalidBucketName(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Catalog(CatalogError::Storage(RepositoryError::Conflict(msg))) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Catalog(e @ CatalogError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        (status, Json(body)).into_response()
    }
}
