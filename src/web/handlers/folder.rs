//! Folder handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::tree::FolderEntry;
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FolderResponse, FolderSummary, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::{run_blocking, AppState};

/// GET /api/folders - List every folder with its display path.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FolderEntry>>>, ApiError> {
    let service = state.service.clone();
    let folders = run_blocking(move || Ok(service.all_folders())).await?;
    Ok(Json(ApiResponse::new(folders)))
}

/// GET /api/folders/:id - Get a folder and its direct children.
pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let service = state.service.clone();
    let folder = run_blocking(move || service.get_folder(&folder_id)).await?;
    Ok(Json(ApiResponse::new(FolderResponse::from(&folder))))
}

/// POST /api/folders/:id - Create a folder under folder `id`.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Path(parent_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderSummary>>), ApiError> {
    let service = state.service.clone();
    let folder = run_blocking(move || service.create_folder(&parent_id, &req.name)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FolderSummary::from(&folder))),
    ))
}
