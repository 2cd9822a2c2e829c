//! Tree-wide handlers: deletion, recent files, breadcrumbs and statistics.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::tree::NodeKind;
use crate::web::dto::{
    ApiResponse, BreadcrumbQuery, BreadcrumbResponse, DeleteResponse, FileResponse, RecentQuery,
    StatsResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::{run_blocking, AppState};

fn query_error(e: QueryRejection) -> ApiError {
    ApiError::bad_request(format!("Invalid query: {}", e.body_text()))
}

/// DELETE /api/delete/:type/:id - Delete a file or an empty folder.
pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let kind: NodeKind = kind.parse()?;

    let service = state.service.clone();
    let node = run_blocking(move || service.delete(kind, &id)).await?;

    Ok(Json(ApiResponse::new(DeleteResponse {
        success: true,
        id: node.id().to_string(),
        kind: node.kind(),
    })))
}

/// GET /api/recent - Most recently accessed or uploaded files.
pub async fn recent_files(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let Query(query) = query.map_err(query_error)?;
    let limit = query.limit.unwrap_or(state.recent_limit);

    let service = state.service.clone();
    let files = run_blocking(move || Ok(service.recent_files(limit))).await?;
    Ok(Json(ApiResponse::new(
        files.iter().map(FileResponse::from).collect(),
    )))
}

/// GET /api/breadcrumb/:id - Root-to-folder path.
///
/// With a `path` query the client-carried token is decoded instead.
pub async fn breadcrumb(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
    query: Result<Query<BreadcrumbQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<BreadcrumbResponse>>, ApiError> {
    let Query(query) = query.map_err(query_error)?;

    let service = state.service.clone();
    let crumb = run_blocking(move || {
        Ok(match query.path.as_deref() {
            Some(token) => service.breadcrumb_from_token(Some(token)),
            None => service.breadcrumb(&folder_id),
        })
    })
    .await?;
    Ok(Json(ApiResponse::new(BreadcrumbResponse::from(crumb))))
}

/// GET /api/stats - File and folder totals.
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let service = state.service.clone();
    let stats = run_blocking(move || Ok(service.stats())).await?;
    Ok(Json(ApiResponse::new(StatsResponse::from(stats))))
}
