//! Recently accessed files, computed on demand from the tree.

use chrono::{DateTime, Utc};

use crate::{HoardError, Result};

use super::namespace::NamespaceTree;
use super::node::FileNode;

/// Up to `limit` files, most recently accessed (or uploaded) first.
///
/// Files with equal timestamps keep their traversal order.
pub fn recent_files(tree: &NamespaceTree, limit: usize) -> Vec<FileNode> {
    let mut files: Vec<&FileNode> = tree.files().collect();
    // sort_by is stable
    files.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
    files.into_iter().take(limit).cloned().collect()
}

/// Record an access to file `file_id` at `at` and return the updated file.
pub fn touch_access(tree: &mut NamespaceTree, file_id: &str, at: DateTime<Utc>) -> Result<FileNode> {
    let file = tree
        .find_file_mut(file_id)
        .ok_or_else(|| HoardError::NotFound(format!("file '{file_id}'")))?;
    file.last_accessed_at = Some(at);
    Ok(file.clone())
}
