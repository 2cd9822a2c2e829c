//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    breadcrumb, create_folder, delete_node, download_file, get_file, get_folder, list_folders,
    recent_files, stats, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Allowance for multipart boundaries and headers on top of the upload limit.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route("/folders", get(list_folders))
        .route("/folders/:id", get(get_folder).post(create_folder))
        .route("/files/:id", get(get_file).post(upload_file))
        .route("/files/:id/content", get(download_file))
        .route("/delete/:type/:id", delete(delete_node))
        .route("/recent", get(recent_files))
        .route("/breadcrumb/:id", get(breadcrumb))
        .route("/stats", get(stats));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
