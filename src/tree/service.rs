//! Tree service: the shared, lock-guarded entry point for all tree operations.
//!
//! Every mutation (and every access touch) takes the write lock for its whole
//! check-then-act sequence on the tree, so two creates can never both pass the same
//! collision check. Read-only views take the read lock and run concurrently.
//!
//! Blob I/O never happens under the tree lock. An upload writes its blob first and
//! resolves its final name again when linking it into the tree.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::{Config, StorageBackend};
use crate::{HoardError, Result};

use super::breadcrumb::{Breadcrumb, Crumb};
use super::id::IdGenerator;
use super::namespace::{FolderEntry, NamespaceTree, TreeStats};
use super::naming::{
    derive_display_name, derive_physical_key, resolve_name_collision, FileNamePolicy,
};
use super::node::{FileNode, FolderNode, Node, NodeKind};
use super::recency;
use super::storage::{BlobStore, DiskBlobStore, MemoryBlobStore};
use super::{DEFAULT_MAX_FILE_SIZE, ROOT_ID, ROOT_NAME};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder ID to upload to.
    pub folder_id: String,
    /// Display name chosen by the caller (optional).
    pub name: Option<String>,
    /// Original filename of the upload.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(folder_id: impl Into<String>, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            folder_id: folder_id.into(),
            name: None,
            filename: filename.into(),
            content,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File descriptor, with the access time already updated.
    pub file: FileNode,
    /// File content.
    pub content: Vec<u8>,
}

/// Owns the namespace tree and the blob store behind it.
pub struct TreeService {
    tree: RwLock<NamespaceTree>,
    blobs: Arc<dyn BlobStore>,
    ids: IdGenerator,
    max_file_size: u64,
    file_policy: FileNamePolicy,
    // Keys written to the blob store but not yet linked into the tree.
    in_flight: Mutex<HashSet<String>>,
}

fn missing_folder(id: &str) -> HoardError {
    HoardError::InvalidInput(format!("folder '{id}' does not exist"))
}

impl TreeService {
    /// Create a service with an empty tree over `blobs`.
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            tree: RwLock::new(NamespaceTree::new(ROOT_NAME)),
            blobs,
            ids: IdGenerator::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            file_policy: FileNamePolicy::default(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Set the policy for duplicate file names.
    pub fn with_file_name_policy(mut self, policy: FileNamePolicy) -> Self {
        self.file_policy = policy;
        self
    }

    /// Replace the tree with an empty one whose root is called `name`.
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.tree = RwLock::new(NamespaceTree::new(name));
        self
    }

    /// Build a service from configuration, creating the seed folders under the root.
    ///
    /// The tree starts empty, so blobs left in the store by an earlier run are removed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let blobs: Arc<dyn BlobStore> = match config.storage.backend {
            StorageBackend::Disk => Arc::new(DiskBlobStore::new(&config.storage.path)?),
            StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
        };

        let service = Self::new(blobs)
            .with_root_name(config.tree.root_name.trim())
            .with_max_file_size(config.storage.max_upload_bytes())
            .with_file_name_policy(config.tree.file_name_policy);

        for name in &config.tree.seed_folders {
            match service.create_folder(ROOT_ID, name) {
                Ok(_) => {}
                Err(e @ (HoardError::Conflict(_) | HoardError::InvalidInput(_))) => {
                    warn!(folder = %name, error = %e, "Skipping seed folder");
                }
                Err(e) => return Err(e),
            }
        }

        if let Err(e) = service.sweep_orphans() {
            warn!(error = %e, "Failed to sweep orphaned blobs");
        }

        Ok(service)
    }

    /// Get the maximum upload size in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Get the policy applied when an upload reuses a file name.
    pub fn file_name_policy(&self) -> FileNamePolicy {
        self.file_policy
    }

    /// Get a folder and its children.
    pub fn get_folder(&self, id: &str) -> Result<FolderNode> {
        self.tree
            .read()
            .find_folder(id)
            .cloned()
            .ok_or_else(|| HoardError::NotFound(format!("folder '{id}'")))
    }

    /// Get a file descriptor. Viewing a file counts as an access.
    pub fn get_file(&self, id: &str) -> Result<FileNode> {
        let file = recency::touch_access(&mut self.tree.write(), id, Utc::now())?;
        debug!(file_id = %id, "File accessed");
        Ok(file)
    }

    /// Get a file descriptor together with its content.
    pub fn open_file(&self, id: &str) -> Result<DownloadResult> {
        let file = self.get_file(id)?;
        let content = self.blobs.get(&file.physical_key)?;
        Ok(DownloadResult { file, content })
    }

    /// ID of the folder that contains `id`, resolved by traversal.
    pub fn parent_id_of(&self, id: &str) -> Option<String> {
        self.tree.read().find_parent(id).map(|p| p.id.clone())
    }

    /// Create an empty folder named `name` under `parent_id`.
    ///
    /// Fails with `InvalidInput` for a blank name, `NotFound` for an unknown parent and
    /// `Conflict` if the parent already has a folder of that name (ignoring case).
    pub fn create_folder(&self, parent_id: &str, name: &str) -> Result<FolderNode> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HoardError::InvalidInput("folder name is required".to_string()));
        }

        let mut tree = self.tree.write();
        let folder = FolderNode::new(self.ids.next_id(), name, Some(parent_id.to_string()));
        tree.insert_child(parent_id, folder.clone().into())?;

        info!(folder_id = %folder.id, parent_id = %parent_id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    /// Store an uploaded file and link it into the tree.
    ///
    /// The bytes are written to the blob store before the node is inserted; if the
    /// insert fails the blob is removed again. The tree lock is not held while writing.
    pub fn create_file(&self, request: UploadRequest) -> Result<FileNode> {
        let size = request.content.len() as u64;
        if size > self.max_file_size {
            return Err(HoardError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let display_name = {
            let tree = self.tree.read();
            let parent = tree
                .find_folder(&request.folder_id)
                .ok_or_else(|| missing_folder(&request.folder_id))?;
            let display_name = derive_display_name(request.name.as_deref(), &request.filename)?;
            // Fail before any I/O; the final name is chosen when linking.
            resolve_name_collision(parent, &display_name, self.file_policy)?;
            display_name
        };
        let id = self.ids.next_id();
        let physical_key = derive_physical_key(&id, &display_name);

        self.in_flight.lock().insert(physical_key.clone());
        let stored = self.store_and_link(&request, id, &display_name, &physical_key, size);
        self.in_flight.lock().remove(&physical_key);
        let file = stored?;

        info!(
            file_id = %file.id,
            folder_id = %file.parent_id,
            physical_key = %file.physical_key,
            size,
            "File uploaded"
        );
        Ok(file)
    }

    fn store_and_link(
        &self,
        request: &UploadRequest,
        id: String,
        display_name: &str,
        physical_key: &str,
        size: u64,
    ) -> Result<FileNode> {
        if let Err(e) = self.blobs.put(physical_key, &request.content) {
            error!(physical_key = %physical_key, error = %e, "Failed to store upload");
            return Err(e);
        }

        let linked = self.link_file(
            &mut self.tree.write(),
            &request.folder_id,
            id,
            display_name,
            physical_key,
            size,
        );
        if linked.is_err() {
            if let Err(cleanup) = self.blobs.delete(physical_key) {
                warn!(physical_key = %physical_key, error = %cleanup, "Failed to discard unlinked blob");
            }
        }
        linked
    }

    fn link_file(
        &self,
        tree: &mut NamespaceTree,
        folder_id: &str,
        id: String,
        display_name: &str,
        physical_key: &str,
        size: u64,
    ) -> Result<FileNode> {
        let parent = tree
            .find_folder(folder_id)
            .ok_or_else(|| missing_folder(folder_id))?;
        let name = resolve_name_collision(parent, display_name, self.file_policy)?;

        let file = FileNode::new(id, name, folder_id, physical_key, size);
        tree.insert_child(folder_id, file.clone().into())?;
        Ok(file)
    }

    /// Remove a file from the tree, then delete its bytes.
    ///
    /// Failure to delete the bytes is logged and does not fail the call.
    pub fn delete_file(&self, id: &str) -> Result<FileNode> {
        let file = {
            let mut tree = self.tree.write();
            let file = tree
                .find_file(id)
                .cloned()
                .ok_or_else(|| HoardError::NotFound(format!("file '{id}'")))?;
            tree.remove_child(id)?;
            file
        };

        match self.blobs.delete(&file.physical_key) {
            Ok(true) => {}
            Ok(false) => {
                warn!(file_id = %id, physical_key = %file.physical_key, "Blob already absent")
            }
            Err(e) => {
                warn!(file_id = %id, physical_key = %file.physical_key, error = %e, "Failed to delete blob")
            }
        }

        info!(file_id = %id, folder_id = %file.parent_id, "File deleted");
        Ok(file)
    }

    /// Remove an empty folder.
    ///
    /// Fails with `Forbidden` for the root and `InvalidOperation` if the folder has children.
    pub fn delete_folder(&self, id: &str) -> Result<FolderNode> {
        if id == ROOT_ID {
            return Err(HoardError::Forbidden("cannot delete root folder".to_string()));
        }

        let mut tree = self.tree.write();
        if tree.find_folder(id).is_none() {
            return Err(HoardError::NotFound(format!("folder '{id}'")));
        }
        let folder = tree
            .remove_child(id)?
            .into_folder()
            .ok_or_else(|| HoardError::NotFound(format!("folder '{id}'")))?;

        info!(folder_id = %id, name = %folder.name, "Folder deleted");
        Ok(folder)
    }

    /// Delete a node of the given kind.
    pub fn delete(&self, kind: NodeKind, id: &str) -> Result<Node> {
        match kind {
            NodeKind::File => self.delete_file(id).map(Node::File),
            NodeKind::Folder => self.delete_folder(id).map(Node::Folder),
        }
    }

    /// Up to `limit` files, most recently accessed or uploaded first.
    pub fn recent_files(&self, limit: usize) -> Vec<FileNode> {
        recency::recent_files(&self.tree.read(), limit)
    }

    /// Breadcrumb for `folder_id`, resolved through the tree.
    pub fn breadcrumb(&self, folder_id: &str) -> Breadcrumb {
        Breadcrumb::resolve(&self.tree.read(), folder_id)
    }

    /// Breadcrumb decoded from a client path token. Display data only.
    pub fn breadcrumb_from_token(&self, token: Option<&str>) -> Breadcrumb {
        let root = Crumb::from(self.tree.read().root());
        Breadcrumb::from_token(token, root)
    }

    /// Every folder with its display path.
    pub fn all_folders(&self) -> Vec<FolderEntry> {
        self.tree.read().all_folders()
    }

    pub fn stats(&self) -> TreeStats {
        self.tree.read().stats()
    }

    /// Remove stored blobs that no file in the tree refers to, plus leftover temporary
    /// files. Returns the number of entries removed.
    ///
    /// Uploads still writing are left alone.
    pub fn sweep_orphans(&self) -> Result<usize> {
        // Held for the whole sweep so no new upload starts writing meanwhile.
        let in_flight = self.in_flight.lock();
        let mut live: HashSet<String> = self
            .tree
            .read()
            .files()
            .map(|f| f.physical_key.clone())
            .collect();
        live.extend(in_flight.iter().cloned());

        let removed = self.blobs.sweep(&live)?;
        if removed > 0 {
            info!(removed, "Removed orphaned blobs");
        }
        Ok(removed)
    }

    /// Verify the structural invariants of the tree.
    pub fn check_invariants(&self) -> Result<()> {
        self.tree.read().check_invariants()
    }
}
