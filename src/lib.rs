//! Hoard - a hierarchical file and folder organizer.
//!
//! Folders and files live in a single in-memory namespace tree; uploaded bytes live in a
//! blob store under keys derived from node IDs. The tree is exposed through a JSON API.

pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod tree;
pub mod web;

pub use config::Config;
pub use error::{HoardError, Result};
pub use tree::{
    BlobStore, Breadcrumb, Crumb, DiskBlobStore, DownloadResult, FileNode, FolderNode,
    MemoryBlobStore, NamespaceTree, Node, NodeKind, TreeService, UploadRequest, ROOT_ID,
};
