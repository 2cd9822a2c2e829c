//! Blob storage for uploaded file content.
//!
//! The tree only ever refers to content by physical key. Keys are opaque to the
//! store but must be a single path segment; [`DiskBlobStore`] shards them into
//! subdirectories:
//! ```text
//! {base_path}/
//! ├── 17/
//! │   ├── 1700000000000.txt
//! │   └── 1700000000001.pdf
//! └── ...
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::{HoardError, Result};

/// Storage for file content, addressed by physical key.
///
/// `put` never overwrites: writing to a key that already holds content fails with
/// `Conflict`.
pub trait BlobStore: Send + Sync {
    /// Store `content` under a key that must not exist yet.
    fn put(&self, key: &str, content: &[u8]) -> Result<()>;

    /// Load the content stored under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove `key`. Returns `false` if nothing was stored under it.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether `key` holds content.
    fn exists(&self, key: &str) -> bool;

    /// Remove every blob whose key is not in `live`, plus leftover temporary files.
    /// Returns the number of entries removed.
    fn sweep(&self, live: &HashSet<String>) -> Result<usize>;
}

/// Reject keys that could escape the store or collide with temporary files.
fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.chars().any(char::is_control);
    if bad {
        return Err(HoardError::InvalidInput(format!("invalid storage key '{key}'")));
    }
    Ok(())
}

fn storage_error(action: &str, key: &str, err: io::Error) -> HoardError {
    HoardError::Storage(format!("failed to {action} '{key}': {err}"))
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
    let scan_error = |e: io::Error| {
        HoardError::Storage(format!("failed to scan '{}': {e}", path.display()))
    };
    fs::read_dir(path)
        .map_err(scan_error)?
        .map(|entry| entry.map(|e| e.path()).map_err(scan_error))
        .collect()
}

/// Blob store backed by a sharded directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl DiskBlobStore {
    /// Create a new DiskBlobStore rooted at `base_path`.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full path for a key: `{base_path}/{shard}/{key}`.
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(Self::shard(key)).join(key)
    }

    /// First two characters of the key.
    fn shard(key: &str) -> &str {
        match key.char_indices().nth(2) {
            Some((idx, _)) => &key[..idx],
            None => key,
        }
    }

    fn write_temp(path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(content)?;
        file.sync_all()
    }
}

impl BlobStore for DiskBlobStore {
    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        validate_key(key)?;
        let final_path = self.blob_path(key);
        let shard_dir = self.base_path.join(Self::shard(key));
        fs::create_dir_all(&shard_dir).map_err(|e| storage_error("create shard for", key, e))?;

        // Content becomes visible under its key only once fully written.
        let temp_path = shard_dir.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = Self::write_temp(&temp_path, content) {
            let _ = fs::remove_file(&temp_path);
            return Err(storage_error("write", key, e));
        }

        let linked = fs::hard_link(&temp_path, &final_path);
        let _ = fs::remove_file(&temp_path);
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(HoardError::Conflict(
                format!("storage key '{key}' already exists"),
            )),
            Err(e) => Err(storage_error("write", key, e)),
        }
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        match fs::read(self.blob_path(key)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(HoardError::NotFound(format!("blob '{key}'")))
            }
            Err(e) => Err(storage_error("read", key, e)),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error("delete", key, e)),
        }
    }

    fn exists(&self, key: &str) -> bool {
        validate_key(key).is_ok() && self.blob_path(key).is_file()
    }

    fn sweep(&self, live: &HashSet<String>) -> Result<usize> {
        let mut removed = 0;
        for shard_dir in list_dir(&self.base_path)? {
            if !shard_dir.is_dir() {
                continue;
            }
            for path in list_dir(&shard_dir)? {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let temp = name.starts_with('.') && name.ends_with(".tmp");
                if (!temp && live.contains(name)) || !path.is_file() {
                    continue;
                }
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove orphaned blob"),
                }
            }
            // Only succeeds for shards left empty.
            let _ = fs::remove_dir(&shard_dir);
        }
        Ok(removed)
    }
}

/// Blob store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut blobs = self.blobs.lock();
        if blobs.contains_key(key) {
            return Err(HoardError::Conflict(format!(
                "storage key '{key}' already exists"
            )));
        }
        blobs.insert(key.to_string(), content.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| HoardError::NotFound(format!("blob '{key}'")))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.lock().remove(key).is_some())
    }

    fn exists(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }

    fn sweep(&self, live: &HashSet<String>) -> Result<usize> {
        let mut blobs = self.blobs.lock();
        let before = blobs.len();
        blobs.retain(|key, _| live.contains(key));
        Ok(before - blobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, DiskBlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("blobs");

        assert!(!store_path.exists());

        let store = DiskBlobStore::new(&store_path).unwrap();

        assert!(store_path.exists());
        assert_eq!(store.base_path(), store_path);
    }

    #[test]
    fn test_put_and_get() {
        let (_temp_dir, store) = setup_store();

        store.put("1700000000000.txt", b"Hello, World!").unwrap();

        assert_eq!(store.get("1700000000000.txt").unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_put_creates_shard_directory() {
        let (_temp_dir, store) = setup_store();

        store.put("ab1234.bin", b"data").unwrap();

        let shard_dir = store.base_path().join("ab");
        assert!(shard_dir.is_dir());
        assert_eq!(store.blob_path("ab1234.bin"), shard_dir.join("ab1234.bin"));
    }

    #[test]
    fn test_put_leaves_no_temp_files() {
        let (_temp_dir, store) = setup_store();

        store.put("ab1234.bin", b"data").unwrap();
        let _ = store.put("ab1234.bin", b"again");

        let entries: Vec<_> = fs::read_dir(store.base_path().join("ab"))
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("ab1234.bin")]);
    }

    #[test]
    fn test_put_never_overwrites() {
        let (_temp_dir, store) = setup_store();

        store.put("42.txt", b"first").unwrap();
        let result = store.put("42.txt", b"second");

        assert!(matches!(result, Err(HoardError::Conflict(_))));
        assert_eq!(store.get("42.txt").unwrap(), b"first");
    }

    #[test]
    fn test_get_not_found() {
        let (_temp_dir, store) = setup_store();

        assert!(matches!(
            store.get("nonexistent.txt"),
            Err(HoardError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, store) = setup_store();

        store.put("delete.txt", b"to delete").unwrap();
        assert!(store.exists("delete.txt"));

        assert!(store.delete("delete.txt").unwrap());
        assert!(!store.exists("delete.txt"));
        assert!(!store.delete("delete.txt").unwrap());
    }

    #[test]
    fn test_rejects_unsafe_keys() {
        let (_temp_dir, store) = setup_store();

        for key in ["", "..", "../escape", "a/b", "a\\b", ".hidden", "bad\nkey"] {
            assert!(
                matches!(store.put(key, b"x"), Err(HoardError::InvalidInput(_))),
                "key {key:?} should be rejected"
            );
            assert!(!store.exists(key));
        }
    }

    #[test]
    fn test_shard() {
        assert_eq!(DiskBlobStore::shard("abcdef.txt"), "ab");
        assert_eq!(DiskBlobStore::shard("x"), "x");
        assert_eq!(DiskBlobStore::shard("日本語.txt"), "日本");
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = (0..=255).collect();

        store.put("binary", &content).unwrap();

        assert_eq!(store.get("binary").unwrap(), content);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());

        store.put("1.txt", b"one").unwrap();
        assert!(matches!(
            store.put("1.txt", b"uno"),
            Err(HoardError::Conflict(_))
        ));
        assert_eq!(store.get("1.txt").unwrap(), b"one");
        assert_eq!(store.len(), 1);

        assert!(store.delete("1.txt").unwrap());
        assert!(!store.delete("1.txt").unwrap());
        assert!(matches!(store.get("1.txt"), Err(HoardError::NotFound(_))));
    }

    #[test]
    fn test_sweep_removes_unreferenced_blobs() {
        let (_temp_dir, store) = setup_store();
        store.put("1700000000000.txt", b"kept").unwrap();
        store.put("1700000000001.txt", b"orphan").unwrap();
        store.put("ab1234.bin", b"orphan").unwrap();

        let live = HashSet::from(["1700000000000.txt".to_string()]);
        let removed = store.sweep(&live).unwrap();

        assert_eq!(removed, 2);
        assert!(store.exists("1700000000000.txt"));
        assert!(!store.exists("1700000000001.txt"));
        assert!(!store.exists("ab1234.bin"));
        assert!(!store.base_path().join("ab").exists());
    }

    #[test]
    fn test_sweep_removes_stale_temp_files() {
        let (_temp_dir, store) = setup_store();
        store.put("17.txt", b"kept").unwrap();
        let temp = store.base_path().join("17").join(".crashed.tmp");
        fs::write(&temp, b"partial").unwrap();

        let removed = store.sweep(&HashSet::from(["17.txt".to_string()])).unwrap();

        assert_eq!(removed, 1);
        assert!(!temp.exists());
        assert!(store.exists("17.txt"));
    }

    #[test]
    fn test_memory_store_sweep() {
        let store = MemoryBlobStore::new();
        store.put("1.txt", b"one").unwrap();
        store.put("2.txt", b"two").unwrap();

        let removed = store.sweep(&HashSet::from(["2.txt".to_string()])).unwrap();

        assert_eq!(removed, 1);
        assert!(!store.exists("1.txt"));
        assert!(store.exists("2.txt"));
    }

    #[test]
    fn test_memory_store_rejects_unsafe_keys() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.put("../x", b"x"),
            Err(HoardError::InvalidInput(_))
        ));
    }
}
