//! Key-value storage interface and its file-backed implementation.
//!
//! The repositories are built strictly on top of [`KeyValueStore`], so the
//! backing store (files, embedded database, remote KV) is swappable without
//! touching session or resource logic.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use vidway_core::error::{GatewayError, Result};

/// A minimal durable byte store.
///
/// Keys are `/`-separated paths of `[A-Za-z0-9._-]` segments. A successful
/// `put` is durable before it returns.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the bytes stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Durably stores `bytes` under `key`, replacing any prior value.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lists all keys beginning with `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// File-per-key store with atomic writes.
///
/// Each key maps to `<root>/<key>.json`. Writes go to a temporary file in
/// the same directory, are fsynced, then renamed over the target, so a crash
/// mid-write never leaves a torn value. An advisory lock file serializes
/// concurrent writers of the same key across processes.
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| GatewayError::storage(format!("failed to create {root:?}: {e}")))?;
        Ok(Self { root })
    }

    fn file_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        });
    if valid {
        Ok(())
    } else {
        Err(GatewayError::storage(format!("invalid storage key '{key}'")))
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.file_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GatewayError::storage(format!(
                "failed to read {path:?}: {e}"
            ))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| GatewayError::storage(format!("failed to create {parent:?}: {e}")))?;
        }

        let _lock = FileLock::acquire(&path)?;

        // Write to a temporary file in the same directory, then rename.
        let tmp_path = temp_path(&path)?;
        let mut tmp_file = File::create(&tmp_path)
            .map_err(|e| GatewayError::storage(format!("failed to create {tmp_path:?}: {e}")))?;
        tmp_file
            .write_all(bytes)
            .and_then(|_| tmp_file.sync_all())
            .map_err(|e| GatewayError::storage(format!("failed to write {tmp_path:?}: {e}")))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path)
            .map_err(|e| GatewayError::storage(format!("failed to rename into {path:?}: {e}")))?;

        tracing::debug!(key, bytes = bytes.len(), "stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GatewayError::storage(format!(
                "failed to delete {path:?}: {e}"
            ))),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = if prefix.is_empty() {
            self.root.clone()
        } else {
            validate_key(prefix.trim_end_matches('/'))?;
            self.root.join(prefix)
        };

        let mut keys = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => {
                return Err(GatewayError::storage(format!(
                    "failed to list {dir:?}: {e}"
                )));
            }
        };

        for entry in entries {
            let entry =
                entry.map_err(|e| GatewayError::storage(format!("failed to list {dir:?}: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if prefix.is_empty() {
                    keys.push(stem.to_string());
                } else {
                    keys.push(format!("{}{}", prefix_with_slash(prefix), stem));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn prefix_with_slash(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| GatewayError::storage(format!("{path:?} has no parent directory")))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| GatewayError::storage(format!("{path:?} has no file name")))?;
    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| GatewayError::storage(format!("failed to open {lock_path:?}: {e}")))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| GatewayError::storage(format!("failed to lock {lock_path:?}: {e}")))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped; removing the
        // lock file is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();

        store.put("sessions/abc", b"payload").await.unwrap();
        let loaded = store.get("sessions/abc").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"payload".as_ref()));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();
        assert!(store.get("sessions/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();

        store.put("state", b"x").await.unwrap();
        store.put("state", b"y").await.unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
        assert_eq!(store.get("state").await.unwrap().as_deref(), Some(b"y".as_ref()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();

        store.put("a", b"1").await.unwrap();
        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_with_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();

        store.put("sessions/b", b"1").await.unwrap();
        store.put("sessions/a", b"2").await.unwrap();
        store.put("resources/search/x", b"3").await.unwrap();

        let keys = store.list_keys("sessions").await.unwrap();
        assert_eq!(keys, vec!["sessions/a", "sessions/b"]);

        let keys = store.list_keys("resources/search").await.unwrap();
        assert_eq!(keys, vec!["resources/search/x"]);
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKvStore::new(temp_dir.path()).unwrap();

        for key in ["", "../escape", "a//b", "a/./b", "bad key"] {
            assert!(store.put(key, b"x").await.is_err(), "key {key:?} accepted");
        }
    }
}
