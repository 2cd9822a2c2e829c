//! Node types for the namespace tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::HoardError;

/// The two kinds of node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    /// Get the lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Folder => "folder",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = HoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeKind::File),
            "folder" => Ok(NodeKind::Folder),
            other => Err(HoardError::InvalidInput(format!(
                "invalid node type '{other}', must be \"file\" or \"folder\""
            ))),
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode {
    /// Unique node ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// ID of the owning folder. Kept in sync on insertion; the tree structure is authoritative.
    pub parent_id: String,
    /// Key of the stored bytes in the blob store.
    pub physical_key: String,
    /// Size in bytes.
    pub size: u64,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// When the file was last viewed or downloaded.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl FileNode {
    /// Create a file node uploaded now.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
        physical_key: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.into(),
            physical_key: physical_key.into(),
            size,
            uploaded_at: Utc::now(),
            last_accessed_at: None,
        }
    }

    /// Most recent of upload and access time, used for recency ordering.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_accessed_at.unwrap_or(self.uploaded_at)
    }
}

/// A folder owning an ordered list of children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderNode {
    /// Unique node ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// ID of the owning folder (None for the root).
    pub parent_id: Option<String>,
    /// Children in insertion order.
    pub children: Vec<Node>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl FolderNode {
    /// Create an empty folder created now.
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            children: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Check whether a direct child of `kind` has `name`, ignoring case.
    pub fn has_child_named(&self, kind: NodeKind, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.children
            .iter()
            .any(|c| c.kind() == kind && c.name().to_lowercase() == wanted)
    }

    /// Get a direct child by ID.
    pub fn child(&self, id: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.id() == id)
    }

    /// Direct child files, in order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.children.iter().filter_map(Node::as_file)
    }

    /// Direct child folders, in order.
    pub fn subfolders(&self) -> impl Iterator<Item = &FolderNode> {
        self.children.iter().filter_map(Node::as_folder)
    }

    /// Check if the folder has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node in the tree: either a file or a folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File(FileNode),
    Folder(FolderNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::File(f) => &f.id,
            Node::Folder(f) => &f.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Folder(f) => &f.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Folder(_) => NodeKind::Folder,
        }
    }

    /// ID of the owning folder as recorded on the node.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Node::File(f) => Some(&f.parent_id),
            Node::Folder(f) => f.parent_id.as_deref(),
        }
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: &str) {
        match self {
            Node::File(f) => f.parent_id = parent_id.to_string(),
            Node::Folder(f) => f.parent_id = Some(parent_id.to_string()),
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Folder(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            Node::Folder(f) => Some(f),
            Node::File(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match self {
            Node::Folder(f) => Some(f),
            Node::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Folder(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<FolderNode> {
        match self {
            Node::Folder(f) => Some(f),
            Node::File(_) => None,
        }
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}

impl From<FolderNode> for Node {
    fn from(folder: FolderNode) -> Self {
        Node::Folder(folder)
    }
}
