//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

/// Create folder request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name. Blank names are rejected by the tree service.
    #[serde(default)]
    #[validate(length(max = 255, message = "Folder name must be at most 255 characters"))]
    pub name: String,
}

/// Query parameters for the recent files view.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Maximum number of files (defaults to the configured limit).
    pub limit: Option<usize>,
}

/// Query parameters for breadcrumb resolution.
#[derive(Debug, Default, Deserialize)]
pub struct BreadcrumbQuery {
    /// Client-carried path token. When present it is decoded instead of walking the tree.
    pub path: Option<String>,
}
