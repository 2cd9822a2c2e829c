//! The namespace tree: lookup and structural mutation.
//!
//! The tree is its own index. Every lookup is a depth-first walk from the root with
//! children visited in insertion order, so results are deterministic. `find_parent`
//! is the ground truth for containment; the `parent_id` recorded on each node is
//! only a denormalized copy kept in sync on insertion.

use std::collections::HashSet;

use serde::Serialize;

use crate::{HoardError, Result};

use super::node::{FileNode, FolderNode, Node, NodeKind};
use super::ROOT_ID;

/// A folder with its display path, as listed by [`NamespaceTree::all_folders`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    /// Display path from the root, e.g. `My Files / Documents`.
    pub path: String,
}

/// Aggregate counts over the whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub total_files: usize,
    /// Folders excluding the root.
    pub total_folders: usize,
    /// Sum of all file sizes in bytes.
    pub total_size: u64,
}

/// Single-rooted tree of folders and files.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    // Always `Node::Folder`; never exposed mutably as a `Node`.
    root: Node,
}

impl NamespaceTree {
    /// Create a tree holding only the root folder.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root: Node::Folder(FolderNode::new(ROOT_ID, root_name, None)),
        }
    }

    /// Get the root folder.
    pub fn root(&self) -> &FolderNode {
        match &self.root {
            Node::Folder(folder) => folder,
            Node::File(_) => unreachable!("namespace root is always a folder"),
        }
    }

    /// Find any node (including the root) by ID.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        find_in(&self.root, id)
    }

    /// Find any node by ID for mutation. The root is excluded.
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        if id == ROOT_ID {
            return None;
        }
        find_in_mut(&mut self.root, id)
    }

    /// Find a folder by ID.
    pub fn find_folder(&self, id: &str) -> Option<&FolderNode> {
        self.find_node(id).and_then(Node::as_folder)
    }

    /// Find a file by ID.
    pub fn find_file(&self, id: &str) -> Option<&FileNode> {
        self.find_node(id).and_then(Node::as_file)
    }

    /// Find a file by ID for mutation.
    pub fn find_file_mut(&mut self, id: &str) -> Option<&mut FileNode> {
        self.find_node_mut(id).and_then(Node::as_file_mut)
    }

    /// Find the folder whose children directly contain `child_id`.
    ///
    /// Returns `None` for the root and for unknown IDs.
    pub fn find_parent(&self, child_id: &str) -> Option<&FolderNode> {
        if child_id == ROOT_ID {
            return None;
        }
        parent_in(self.root(), child_id)
    }

    fn find_folder_mut(&mut self, id: &str) -> Option<&mut FolderNode> {
        if id == ROOT_ID {
            return self.root.as_folder_mut();
        }
        self.find_node_mut(id).and_then(Node::as_folder_mut)
    }

    fn find_parent_mut(&mut self, child_id: &str) -> Option<&mut FolderNode> {
        if child_id == ROOT_ID {
            return None;
        }
        parent_in_mut(self.root.as_folder_mut()?, child_id)
    }

    /// Check whether a node with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    /// Append `node` to the children of folder `parent_id`.
    ///
    /// Fails with `NotFound` if the parent does not resolve to a folder and with
    /// `Conflict` if a child of the same kind already has the name (ignoring case)
    /// or the ID is already in use. The node's `parent_id` is set to `parent_id`.
    pub fn insert_child(&mut self, parent_id: &str, mut node: Node) -> Result<&Node> {
        if self.contains(node.id()) {
            return Err(HoardError::Conflict(format!(
                "node id '{}' already in use",
                node.id()
            )));
        }

        let parent = self
            .find_folder_mut(parent_id)
            .ok_or_else(|| HoardError::NotFound(format!("folder '{parent_id}'")))?;

        if parent.has_child_named(node.kind(), node.name()) {
            return Err(HoardError::Conflict(format!(
                "a {} named '{}' already exists in '{}'",
                node.kind(),
                node.name(),
                parent.name
            )));
        }

        node.set_parent_id(&parent.id);
        let index = parent.children.len();
        parent.children.push(node);
        Ok(&parent.children[index])
    }

    /// Detach node `id` from its parent and return it.
    ///
    /// Fails with `Forbidden` for the root, `NotFound` if no folder contains `id`,
    /// and `InvalidOperation` if `id` is a folder that still has children.
    pub fn remove_child(&mut self, id: &str) -> Result<Node> {
        if id == ROOT_ID {
            return Err(HoardError::Forbidden("cannot delete root folder".to_string()));
        }

        let parent = self
            .find_parent_mut(id)
            .ok_or_else(|| HoardError::NotFound(format!("node '{id}'")))?;

        let index = parent
            .children
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| HoardError::NotFound(format!("node '{id}'")))?;

        if let Node::Folder(folder) = &parent.children[index] {
            if !folder.is_empty() {
                return Err(HoardError::InvalidOperation(format!(
                    "cannot delete non-empty folder '{}', delete its contents first",
                    folder.name
                )));
            }
        }

        Ok(parent.children.remove(index))
    }

    /// Depth-first pre-order walk over all nodes, root first.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![&self.root],
        }
    }

    /// All files in traversal order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.walk().filter_map(Node::as_file)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Check if the tree holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// Every folder, root included, with its display path.
    pub fn all_folders(&self) -> Vec<FolderEntry> {
        fn collect(folder: &FolderNode, prefix: &str, out: &mut Vec<FolderEntry>) {
            let path = if prefix.is_empty() {
                folder.name.clone()
            } else {
                format!("{prefix} / {}", folder.name)
            };
            out.push(FolderEntry {
                id: folder.id.clone(),
                name: folder.name.clone(),
                path: path.clone(),
            });
            for sub in folder.subfolders() {
                collect(sub, &path, out);
            }
        }

        let mut out = Vec::new();
        collect(self.root(), "", &mut out);
        out
    }

    /// File/folder counts and total size.
    pub fn stats(&self) -> TreeStats {
        self.walk()
            .fold(TreeStats::default(), |mut stats, node| {
                match node {
                    Node::File(f) => {
                        stats.total_files += 1;
                        stats.total_size += f.size;
                    }
                    Node::Folder(_) => stats.total_folders += 1,
                }
                stats
            })
            .without_root()
    }

    /// Verify the structural invariants of the whole tree.
    ///
    /// Checks that IDs are unique, that every recorded `parent_id` matches the folder
    /// that actually contains the node, and that no folder holds two children of the
    /// same kind whose names are equal ignoring case.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |msg: String| HoardError::InvalidOperation(format!("tree invariant: {msg}"));

        let mut ids = HashSet::new();
        for node in self.walk() {
            if !ids.insert(node.id()) {
                return Err(violation(format!("duplicate id '{}'", node.id())));
            }

            let Node::Folder(folder) = node else {
                continue;
            };

            let mut names: HashSet<(NodeKind, String)> = HashSet::new();
            for child in &folder.children {
                if child.id() == ROOT_ID {
                    return Err(violation("root appears as a child".to_string()));
                }
                if child.parent_id() != Some(folder.id.as_str()) {
                    return Err(violation(format!(
                        "'{}' records parent {:?} but is contained in '{}'",
                        child.id(),
                        child.parent_id(),
                        folder.id
                    )));
                }
                if !names.insert((child.kind(), child.name().to_lowercase())) {
                    return Err(violation(format!(
                        "duplicate {} name '{}' in '{}'",
                        child.kind(),
                        child.name(),
                        folder.id
                    )));
                }
            }
        }

        if self.root().parent_id.is_some() {
            return Err(violation("root has a parent".to_string()));
        }
        Ok(())
    }
}

impl TreeStats {
    fn without_root(mut self) -> Self {
        self.total_folders = self.total_folders.saturating_sub(1);
        self
    }
}

/// Iterator returned by [`NamespaceTree::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Node::Folder(folder) = node {
            self.stack.extend(folder.children.iter().rev());
        }
        Some(node)
    }
}

fn find_in<'a>(node: &'a Node, id: &str) -> Option<&'a Node> {
    if node.id() == id {
        return Some(node);
    }
    match node {
        Node::Folder(folder) => folder.children.iter().find_map(|c| find_in(c, id)),
        Node::File(_) => None,
    }
}

fn find_in_mut<'a>(node: &'a mut Node, id: &str) -> Option<&'a mut Node> {
    if node.id() == id {
        return Some(node);
    }
    match node {
        Node::Folder(folder) => folder.children.iter_mut().find_map(|c| find_in_mut(c, id)),
        Node::File(_) => None,
    }
}

fn parent_in<'a>(folder: &'a FolderNode, child_id: &str) -> Option<&'a FolderNode> {
    if folder.children.iter().any(|c| c.id() == child_id) {
        return Some(folder);
    }
    folder
        .subfolders()
        .find_map(|sub| parent_in(sub, child_id))
}

fn parent_in_mut<'a>(folder: &'a mut FolderNode, child_id: &str) -> Option<&'a mut FolderNode> {
    if folder.children.iter().any(|c| c.id() == child_id) {
        return Some(folder);
    }
    folder
        .children
        .iter_mut()
        .filter_map(Node::as_folder_mut)
        .find_map(|sub| parent_in_mut(sub, child_id))
}
