//! Response DTOs for Web API.

use chrono::Utc;
use serde::Serialize;

use crate::datetime::{format_file_size, format_relative, to_rfc3339};
use crate::tree::{
    Breadcrumb, Crumb, FileCategory, FileNode, FolderNode, Node, NodeKind, TreeStats,
};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// File descriptor.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size, e.g. `1.5 KB`.
    pub size_display: String,
    pub category: FileCategory,
    pub uploaded_at: String,
    /// Upload time relative to now, e.g. `3 hours ago`.
    pub uploaded_relative: String,
    pub last_accessed_at: Option<String>,
}

impl From<&FileNode> for FileResponse {
    fn from(file: &FileNode) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
            parent_id: file.parent_id.clone(),
            size: file.size,
            size_display: format_file_size(file.size),
            category: FileCategory::from_name(&file.name),
            uploaded_at: to_rfc3339(&file.uploaded_at),
            uploaded_relative: format_relative(&file.uploaded_at, &Utc::now()),
            last_accessed_at: file.last_accessed_at.as_ref().map(to_rfc3339),
        }
    }
}

/// Folder without its contents.
#[derive(Debug, Serialize)]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    /// Number of direct children.
    pub child_count: usize,
    pub created_at: String,
}

impl From<&FolderNode> for FolderSummary {
    fn from(folder: &FolderNode) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
            child_count: folder.children.len(),
            created_at: to_rfc3339(&folder.created_at),
        }
    }
}

/// A direct child in a folder listing, tagged with its kind.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChildResponse {
    File(FileResponse),
    Folder(FolderSummary),
}

impl From<&Node> for ChildResponse {
    fn from(node: &Node) -> Self {
        match node {
            Node::File(file) => ChildResponse::File(file.into()),
            Node::Folder(folder) => ChildResponse::Folder(folder.into()),
        }
    }
}

/// Folder with its direct children, in insertion order.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub children: Vec<ChildResponse>,
}

impl From<&FolderNode> for FolderResponse {
    fn from(folder: &FolderNode) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
            created_at: to_rfc3339(&folder.created_at),
            children: folder.children.iter().map(ChildResponse::from).collect(),
        }
    }
}

/// Deletion result.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// Breadcrumb with the path token that reproduces it.
#[derive(Debug, Serialize)]
pub struct BreadcrumbResponse {
    pub path: Vec<Crumb>,
    pub token: String,
}

impl From<Breadcrumb> for BreadcrumbResponse {
    fn from(crumb: Breadcrumb) -> Self {
        let token = crumb.to_token();
        Self {
            path: crumb.into_crumbs(),
            token,
        }
    }
}

/// Tree statistics.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_files: usize,
    pub total_folders: usize,
    /// Total size in bytes.
    pub total_size: u64,
    pub total_size_display: String,
}

impl From<TreeStats> for StatsResponse {
    fn from(stats: TreeStats) -> Self {
        Self {
            total_files: stats.total_files,
            total_folders: stats.total_folders,
            total_size: stats.total_size,
            total_size_display: format_file_size(stats.total_size),
        }
    }
}
