//! In-memory Filesystem for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use inksync_core::validate_path;

use super::Filesystem;
use crate::error::{Result, StoreError};

/// A [`Filesystem`] backed by a map. Directories exist implicitly
/// whenever a file lives below them, or explicitly after `mkdir`.
#[derive(Default)]
pub struct MemoryFilesystem {
    inner: RwLock<MemoryFsInner>,
}

#[derive(Default)]
struct MemoryFsInner {
    files: BTreeMap<String, Bytes>,
    dirs: BTreeSet<String>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err<E: std::fmt::Display>(e: E) -> StoreError {
        StoreError::InvalidData(format!("lock poisoned: {e}"))
    }
}

fn dir_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    }
}

impl MemoryFsInner {
    fn is_dir(&self, path: &str) -> bool {
        if path.is_empty() || self.dirs.contains(path) {
            return true;
        }
        let prefix = dir_prefix(path);
        self.files.keys().any(|p| p.starts_with(&prefix))
            || self.dirs.iter().any(|d| d.starts_with(&prefix))
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn read_from(&self, path: &str) -> Result<Bytes> {
        validate_path(path)?;
        let inner = self.inner.read().map_err(Self::lock_err)?;
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write_to(&self, path: &str, data: &[u8]) -> Result<()> {
        validate_path(path)?;
        let mut inner = self.inner.write().map_err(Self::lock_err)?;
        if inner.is_dir(path) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{path} is a directory"),
            )));
        }
        inner.files.insert(path.to_string(), Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut inner = self.inner.write().map_err(Self::lock_err)?;
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        let inner = self.inner.read().map_err(Self::lock_err)?;
        Ok(inner.files.contains_key(path) || inner.is_dir(path))
    }

    async fn size_of(&self, path: &str) -> Result<u64> {
        Ok(self.read_from(path).await?.len() as u64)
    }

    async fn listdir(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        if !dir.is_empty() {
            validate_path(dir)?;
        }
        let prefix = dir_prefix(dir);
        let inner = self.inner.read().map_err(Self::lock_err)?;

        Ok(inner
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .filter(|p| recursive || !p[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        if !path.is_empty() {
            validate_path(path)?;
        }
        let inner = self.inner.read().map_err(Self::lock_err)?;
        Ok(inner.is_dir(path))
    }

    async fn copy_to(&self, from: &str, to: &str) -> Result<()> {
        let data = self.read_from(from).await?;
        self.write_to(to, &data).await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut inner = self.inner.write().map_err(Self::lock_err)?;
        inner.dirs.insert(path.to_string());
        Ok(())
    }
}
