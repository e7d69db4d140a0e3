//! File-backed key-value storage
//!
//! Each key is stored in its own file inside the data directory.
//! Uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/loom/` (configurable via `Config`)
//!
//! Files:
//! - `favorites.json` - key `@favorites`
//! - `diary_entries.json` - key `@diary_entries`

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::KeyValueStorage;

/// Key-value storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage handler writing under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for(key))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied { path, source: e })
            }
            // Not UTF-8; the bytes stay on disk for `copy`
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(StorageError::InvalidData { path, source: e })
            }
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes()).await?;
        debug!(key, path = %path.display(), bytes = value.len(), "Wrote storage slot");
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<bool> {
        let source = self.path_for(from);
        let data = match fs::read(&source).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StorageError::ReadError {
                    path: source,
                    source: e,
                })
            }
        };

        let target = self.path_for(to);
        atomic_write(&target, &data).await?;
        debug!(from, to, bytes = data.len(), "Copied storage slot");
        Ok(true)
    }
}

/// Map a storage key to a file name
///
/// A leading `@` is dropped and anything outside `[A-Za-z0-9_-]` becomes `_`.
fn file_name_for(key: &str) -> String {
    let stem: String = key
        .strip_prefix('@')
        .unwrap_or(key)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "_.json".to_string()
    } else {
        format!("{}.json", stem)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
/// The temp file is removed if any step fails.
async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    // Same directory so the rename stays atomic
    let temp_path = path.with_extension("tmp");

    let result = write_and_rename(&temp_path, path, data).await;
    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}

async fn write_and_rename(temp_path: &Path, path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = File::create(temp_path)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))?;

    file.write_all(data)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.to_path_buf()))?;
    drop(file);

    fs::rename(temp_path, path)
        .await
        .map_err(|source| StorageError::AtomicWriteFailed {
            from: temp_path.to_path_buf(),
            to: path.to_path_buf(),
            source,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_for_keys() {
        assert_eq!(file_name_for("@favorites"), "favorites.json");
        assert_eq!(file_name_for("@diary_entries"), "diary_entries.json");
        assert_eq!(file_name_for("@favorites.corrupt"), "favorites_corrupt.json");
        assert_eq!(file_name_for("../escape"), "___escape.json");
        assert_eq!(file_name_for("@"), "_.json");
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(storage.get("@favorites").await.unwrap().is_none());
        // Reading never creates the slot
        assert!(!storage.path_for("@favorites").exists());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set("@favorites", "[]").await.unwrap();
        assert_eq!(storage.get("@favorites").await.unwrap().as_deref(), Some("[]"));

        storage.set("@favorites", r#"[{"id":"b1"}]"#).await.unwrap();
        assert_eq!(
            storage.get("@favorites").await.unwrap().as_deref(),
            Some(r#"[{"id":"b1"}]"#)
        );

        // No temp file left behind
        assert!(!storage.path_for("@favorites").with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set("@favorites", "fav").await.unwrap();
        storage.set("@diary_entries", "diary").await.unwrap();

        assert_eq!(storage.get("@favorites").await.unwrap().as_deref(), Some("fav"));
        assert_eq!(
            storage.get("@diary_entries").await.unwrap().as_deref(),
            Some("diary")
        );
    }

    #[tokio::test]
    async fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.json");

        atomic_write(&nested_path, b"test data").await.unwrap();

        assert!(nested_path.exists());
        let content = std::fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupt_and_copied_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        let raw: &[u8] = b"[{\"id\":\"b1\",\"title\":\"Caf\xe9\"}]";
        std::fs::write(storage.path_for("@favorites"), raw).unwrap();

        let err = storage.get("@favorites").await.unwrap_err();
        assert!(err.is_corrupt_data());

        assert!(storage.copy("@favorites", "@favorites.corrupt").await.unwrap());
        let backup = std::fs::read(storage.path_for("@favorites.corrupt")).unwrap();
        assert_eq!(backup, raw);
    }

    #[tokio::test]
    async fn test_copy_missing_slot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(!storage.copy("@favorites", "@favorites.corrupt").await.unwrap());
        assert!(!storage.path_for("@favorites.corrupt").exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        // A non-empty directory at the target makes the rename fail
        let target = temp_dir.path().join("favorites.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = atomic_write(&target, b"[]").await.unwrap_err();

        assert!(matches!(err, StorageError::AtomicWriteFailed { .. }));
        assert!(!target.with_extension("tmp").exists());
    }
}
