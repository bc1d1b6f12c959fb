use std::path::{Path, PathBuf};

use crate::{fingerprint, BoxFuture, ObjectStore, ObjectStoreError};

/// Filesystem-backed `ObjectStore`. Keys are treated as `/`-separated
/// relative paths under `root`; parent directories are created on write.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for FilesystemObjectStore {
    fn put<'a>(&'a self, key: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<String, ObjectStoreError>> {
        Box::pin(async move {
            let path = self.path_for(key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| ObjectStoreError::Io {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
            }
            let tag = fingerprint(&bytes);
            tokio::fs::write(&path, &bytes).await.map_err(|e| ObjectStoreError::Io {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            Ok(tag)
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, ObjectStoreError>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ObjectStoreError::Io {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            }
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, ObjectStoreError>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::metadata(&path).await {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(ObjectStoreError::Io {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            }
        })
    }

    fn list_prefix<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ObjectStoreError>> {
        Box::pin(async move {
            let dir = self.path_for(prefix);
            let mut keys = Vec::new();
            collect_keys(&self.root, &dir, &mut keys).await?;
            Ok(keys)
        })
    }
}

fn collect_keys<'a>(
    root: &'a Path,
    dir: &'a Path,
    out: &'a mut Vec<String>,
) -> BoxFuture<'a, Result<(), ObjectStoreError>> {
    Box::pin(async move {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(ObjectStoreError::Io {
                    key: dir.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        while let Some(entry) = entries.next_entry().await.map_err(|e| ObjectStoreError::Io {
            key: dir.display().to_string(),
            message: e.to_string(),
        })? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| ObjectStoreError::Io {
                key: path.display().to_string(),
                message: e.to_string(),
            })?;
            if file_type.is_dir() {
                collect_keys(root, &path, out).await?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"));
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none_and_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        assert_eq!(store.get("dem/srtm/N46W113.hgt").await.unwrap(), None);
        assert!(!store.exists("dem/srtm/N46W113.hgt").await.unwrap());
    }

    #[tokio::test]
    async fn put_then_get_round_trips_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        let tag1 = store.put("chunks/v1/terrain/r10/0/0.bin", vec![1, 2, 3]).await.unwrap();
        assert!(store.exists("chunks/v1/terrain/r10/0/0.bin").await.unwrap());
        assert_eq!(
            store.get("chunks/v1/terrain/r10/0/0.bin").await.unwrap(),
            Some(vec![1, 2, 3])
        );

        let tag2 = store.put("chunks/v1/terrain/r10/0/0.bin", vec![1, 2, 3]).await.unwrap();
        assert_eq!(tag1, tag2);
    }

    #[tokio::test]
    async fn list_prefix_finds_nested_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        store.put("dem/srtm/N46W113.hgt", vec![0; 4]).await.unwrap();
        store.put("dem/srtm/N47W113.hgt", vec![0; 4]).await.unwrap();
        store.put("chunks/v1/terrain/r10/0/0.bin", vec![0; 4]).await.unwrap();

        let mut keys = store.list_prefix("dem/srtm").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["dem/srtm/N46W113.hgt", "dem/srtm/N47W113.hgt"]);
    }

    #[tokio::test]
    async fn list_prefix_on_absent_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemObjectStore::new(dir.path());
        assert!(store.list_prefix("dem/srtm").await.unwrap().is_empty());
    }
}
