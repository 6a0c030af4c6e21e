//! Axum router configuration with middleware.
//!
//! All catalog routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: request body limit, CORS, tracing.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.limits.max_document_bytes;

    let api_routes = Router::new()
        // Buckets
        .route(
            "/buckets",
            post(handlers::bucket::create_bucket).get(handlers::bucket::list_buckets),
        )
        .route("/buckets/{bucket_id}", get(handlers::bucket::get_bucket))
        // Workflows
        .route(
            "/buckets/{bucket_id}/workflows",
            post(handlers::workflow::create_workflow).get(handlers::workflow::list_workflows),
        )
        .route(
            "/buckets/{bucket_id}/workflows/{workflow_id}",
            get(handlers::workflow::get_latest_revision),
        )
        // Revisions
        .route(
            "/buckets/{bucket_id}/workflows/{workflow_id}/revisions",
            post(handlers::workflow::create_revision).get(handlers::workflow::list_revisions),
        )
        .route(
            "/buckets/{bucket_id}/workflows/{workflow_id}/revisions/{revision_number}",
            get(handlers::workflow::get_revision),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health::health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
