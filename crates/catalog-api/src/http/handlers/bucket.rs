//! Bucket handlers for the REST API.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::CatalogError;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for bucket creation.
#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    pub name: String,
}

/// Parse a bucket id from the path; malformed ids cannot name a bucket.
pub fn parse_bucket_id(raw: &str) -> Result<BucketId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Catalog(CatalogError::BucketNotFound))
}

/// POST /api/v1/buckets - Create a bucket.
pub async fn create_bucket(
    State(state): State<AppState>,
    Json(body): Json<CreateBucketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Bucket>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bucket = state.bucket_service.create_bucket(&body.name).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let self_link = format!("/api/v1/buckets/{}", bucket.id);
    let workflows_link = format!("{self_link}/workflows");
    let resp = ApiResponse::success(bucket, request_id, elapsed)
        .with_link("self", &self_link)
        .with_link("workflows", &workflows_link);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/buckets - List buckets.
pub async fn list_buckets(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Bucket>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let buckets = state.bucket_service.list_buckets().await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(buckets, request_id, elapsed).with_link("self", "/api/v1/buckets"),
    ))
}

/// GET /api/v1/buckets/{bucket_id} - Get a bucket by id.
pub async fn get_bucket(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
) -> Result<Json<ApiResponse<Bucket>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_bucket_id(&bucket_id)?;
    let bucket = state.bucket_service.get_bucket(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let self_link = format!("/api/v1/buckets/{}", bucket.id);
    let workflows_link = format!("{self_link}/workflows");
    Ok(Json(
        ApiResponse::success(bucket, request_id, elapsed)
            .with_link("self", &self_link)
            .with_link("workflows", &workflows_link),
    ))
}
