//! Workflow and revision handlers for the REST API.
//!
//! Request bodies are the raw XML documents. Metadata responses use the
//! JSON envelope; `?alt=...` returns the stored bytes untouched.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use catalog_types::bucket::BucketId;
use catalog_types::error::CatalogError;
use catalog_types::page::Page;
use catalog_types::workflow::{RevisionView, WorkflowId, WorkflowMetadata};

use crate::http::error::AppError;
use crate::http::extractors::query::{PageQuery, RevisionQuery};
use crate::http::handlers::bucket::parse_bucket_id;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn parse_workflow_id(raw: &str) -> Result<WorkflowId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Catalog(CatalogError::WorkflowNotFound))
}

fn workflow_link(bucket_id: &BucketId, workflow_id: &WorkflowId) -> String {
    format!("/api/v1/buckets/{bucket_id}/workflows/{workflow_id}")
}

fn created(meta: WorkflowMetadata, request_id: String, elapsed: u64) -> (StatusCode, Json<ApiResponse<WorkflowMetadata>>) {
    let base = workflow_link(&meta.bucket_id, &meta.workflow_id);
    let self_link = format!("{base}/revisions/{}", meta.revision_number);
    let raw_link = format!("{self_link}?alt=xml");
    let resp = ApiResponse::success(meta, request_id, elapsed)
        .with_link("self", &self_link)
        .with_link("raw", &raw_link)
        .with_link("workflow", &base);
    (StatusCode::CREATED, Json(resp))
}

fn revision_response(view: RevisionView, request_id: String, elapsed: u64) -> Response {
    match view {
        RevisionView::Raw(raw) => (
            [
                (CONTENT_TYPE, HeaderValue::from_static(raw.media_type)),
                (CONTENT_LENGTH, HeaderValue::from(raw.content_length)),
            ],
            raw.bytes,
        )
            .into_response(),
        RevisionView::Metadata(meta) => {
            let base = workflow_link(&meta.bucket_id, &meta.workflow_id);
            let self_link = format!("{base}/revisions/{}", meta.revision_number);
            let raw_link = format!("{self_link}?alt=xml");
            Json(
                ApiResponse::success(meta, request_id, elapsed)
                    .with_link("self", &self_link)
                    .with_link("raw", &raw_link)
                    .with_link("workflow", &base),
            )
            .into_response()
        }
    }
}

/// POST /api/v1/buckets/{bucket_id}/workflows - Create a workflow from its first revision.
pub async fn create_workflow(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<WorkflowMetadata>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let meta = state
        .revision_service
        .create_revision(&bucket_id, None, body.to_vec())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(created(meta, request_id, elapsed))
}

/// POST /api/v1/buckets/{bucket_id}/workflows/{workflow_id}/revisions - Append a revision.
pub async fn create_revision(
    State(state): State<AppState>,
    Path((bucket_id, workflow_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<WorkflowMetadata>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let workflow_id = parse_workflow_id(&workflow_id)?;
    let meta = state
        .revision_service
        .create_revision(&bucket_id, Some(&workflow_id), body.to_vec())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(created(meta, request_id, elapsed))
}

/// GET /api/v1/buckets/{bucket_id}/workflows - Latest revision of every workflow.
pub async fn list_workflows(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<WorkflowMetadata>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let page = state
        .query_service
        .list_revisions(&bucket_id, None, query.into())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let base = format!("/api/v1/buckets/{bucket_id}/workflows");
    Ok(Json(
        ApiResponse::success(page, request_id, elapsed).with_page_links(&base),
    ))
}

/// GET /api/v1/buckets/{bucket_id}/workflows/{workflow_id}/revisions - Revision history.
pub async fn list_revisions(
    State(state): State<AppState>,
    Path((bucket_id, workflow_id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<WorkflowMetadata>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let workflow_id = parse_workflow_id(&workflow_id)?;
    let page = state
        .query_service
        .list_revisions(&bucket_id, Some(&workflow_id), query.into())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let base = format!("{}/revisions", workflow_link(&bucket_id, &workflow_id));
    Ok(Json(
        ApiResponse::success(page, request_id, elapsed).with_page_links(&base),
    ))
}

/// GET /api/v1/buckets/{bucket_id}/workflows/{workflow_id} - Latest revision.
pub async fn get_latest_revision(
    State(state): State<AppState>,
    Path((bucket_id, workflow_id)): Path<(String, String)>,
    Query(query): Query<RevisionQuery>,
) -> Result<Response, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let workflow_id = parse_workflow_id(&workflow_id)?;
    let view = state
        .query_service
        .get_revision(&bucket_id, &workflow_id, None, query.raw())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(revision_response(view, request_id, elapsed))
}

/// GET /api/v1/buckets/{bucket_id}/workflows/{workflow_id}/revisions/{revision_number}
pub async fn get_revision(
    State(state): State<AppState>,
    Path((bucket_id, workflow_id, revision_number)): Path<(String, String, i64)>,
    Query(query): Query<RevisionQuery>,
) -> Result<Response, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket_id = parse_bucket_id(&bucket_id)?;
    let workflow_id = parse_workflow_id(&workflow_id)?;
    let view = state
        .query_service
        .get_revision(&bucket_id, &workflow_id, Some(revision_number), query.raw())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(revision_response(view, request_id, elapsed))
}
