//! Filesystem over a plain directory tree, via tokio::fs and walkdir.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use walkdir::WalkDir;

use inksync_core::{validate_path, META_DIR};

use super::{join, Filesystem};
use crate::error::{Result, StoreError};

/// Writes land in a scratch file under the metadata directory and are
/// renamed into place, so readers never observe a half-written file.
const SCRATCH_DIR: &str = "tmp";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A [`Filesystem`] rooted at a directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    /// Like `resolve`, but `""` names the root itself.
    fn resolve_dir(&self, dir: &str) -> Result<PathBuf> {
        if dir.is_empty() {
            Ok(self.root.clone())
        } else {
            self.resolve(dir)
        }
    }

    fn scratch_path(&self) -> PathBuf {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(META_DIR)
            .join(SCRATCH_DIR)
            .join(format!("{}-{}.part", std::process::id(), n))
    }
}

fn not_found(path: &str) -> impl Fn(std::io::Error) -> StoreError + '_ {
    move |e| {
        if e.kind() == ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io(e)
        }
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn read_from(&self, path: &str) -> Result<Bytes> {
        let full = self.resolve(path)?;
        let data = tokio::fs::read(&full).await.map_err(not_found(path))?;
        Ok(Bytes::from(data))
    }

    async fn write_to(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        ensure_parent(&full).await?;

        let scratch = self.scratch_path();
        ensure_parent(&scratch).await?;
        tokio::fs::write(&scratch, data).await?;
        if let Err(e) = tokio::fs::rename(&scratch, &full).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full).await.map_err(not_found(path))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full).await?)
    }

    async fn size_of(&self, path: &str) -> Result<u64> {
        let full = self.resolve(path)?;
        let meta = tokio::fs::metadata(&full).await.map_err(not_found(path))?;
        Ok(meta.len())
    }

    async fn listdir(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        let base = self.resolve_dir(dir)?;
        let dir = dir.to_string();

        tokio::task::spawn_blocking(move || {
            let depth = if recursive { usize::MAX } else { 1 };
            let mut files = Vec::new();

            for entry in WalkDir::new(&base).min_depth(1).max_depth(depth) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if e.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) => {
                        // Directory vanished mid-walk, or never existed.
                        continue;
                    }
                    Err(e) => return Err(StoreError::Io(e.into())),
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let relative = match entry.path().strip_prefix(&base) {
                    Ok(rel) => rel,
                    Err(_) => continue,
                };
                let mut parts = Vec::new();
                for component in relative.components() {
                    match component.as_os_str().to_str() {
                        Some(part) => parts.push(part),
                        None => {
                            tracing::warn!(path = %entry.path().display(), "skipping non-UTF-8 path");
                            parts.clear();
                            break;
                        }
                    }
                }
                if !parts.is_empty() {
                    files.push(join(&dir, &parts.join("/")));
                }
            }

            files.sort();
            Ok(files)
        })
        .await
        .map_err(|e| StoreError::TaskJoin(e.to_string()))?
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        let full = self.resolve_dir(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn copy_to(&self, from: &str, to: &str) -> Result<()> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        ensure_parent(&dst).await?;
        tokio::fs::copy(&src, &dst).await.map_err(not_found(from))?;
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full).await?;
        Ok(())
    }
}
