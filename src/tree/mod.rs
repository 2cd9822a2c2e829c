//! Hierarchical namespace for Hoard.
//!
//! This module provides the in-memory folder/file tree and everything built on it:
//! - Node types (a file or a folder, folders own their children)
//! - Tree lookup and structural mutation
//! - Display-name and physical-key derivation
//! - Recently accessed files and breadcrumbs, computed by traversal
//! - Blob storage for uploaded bytes
//! - `TreeService`, the lock-guarded entry point used by the web layer

mod breadcrumb;
mod id;
mod namespace;
mod naming;
mod node;
mod recency;
mod service;
mod storage;

pub use breadcrumb::{build_path_token, parse_path_token, resolve_path, Breadcrumb, Crumb};
pub use id::IdGenerator;
pub use namespace::{FolderEntry, NamespaceTree, TreeStats, Walk};
pub use naming::{
    derive_display_name, derive_physical_key, extension, resolve_name_collision, sanitize_name,
    FileCategory, FileNamePolicy,
};
pub use node::{FileNode, FolderNode, Node, NodeKind};
pub use recency::{recent_files, touch_access};
pub use service::{DownloadResult, TreeService, UploadRequest};
pub use storage::{BlobStore, DiskBlobStore, MemoryBlobStore};

/// Reserved identifier of the root folder.
pub const ROOT_ID: &str = "root";

/// Default display name of the root folder.
pub const ROOT_NAME: &str = "My Files";

/// Default maximum upload size (50MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default number of entries returned by the recent files view.
pub const DEFAULT_RECENT_LIMIT: usize = 20;
