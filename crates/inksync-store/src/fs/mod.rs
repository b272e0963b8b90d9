//! Filesystem capability: byte-level access to a tree under a fixed root.
//!
//! Every path is relative to the root and validated with
//! [`inksync_core::validate_path`]; escaping the root is rejected.

mod local;
mod memory;

pub use local::LocalFilesystem;
pub use memory::MemoryFilesystem;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use inksync_core::ContentHash;

use crate::error::{Result, StoreError};

/// Byte-level file operations relative to a root directory.
///
/// Implementations exist for a plain directory tree ([`LocalFilesystem`]) and
/// for tests ([`MemoryFilesystem`]). Platform adapters (sandboxed storage,
/// encrypting wrappers) implement the same trait.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read a whole file. Missing files yield [`StoreError::NotFound`].
    async fn read_from(&self, path: &str) -> Result<Bytes>;

    /// Replace a file's contents, creating intermediate directories.
    async fn write_to(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Remove a file. Fails with [`StoreError::NotFound`] if absent.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Size of a file in bytes.
    async fn size_of(&self, path: &str) -> Result<u64>;

    /// Files (never directories) below `dir`, as root-relative paths in
    /// sorted order. `""` lists from the root.
    async fn listdir(&self, dir: &str, recursive: bool) -> Result<Vec<String>>;

    async fn is_dir(&self, path: &str) -> Result<bool>;

    /// Copy a file, creating the destination's directories.
    async fn copy_to(&self, from: &str, to: &str) -> Result<()>;

    /// Create a directory and its parents.
    async fn mkdir(&self, path: &str) -> Result<()>;
}

#[async_trait]
impl<F: Filesystem + ?Sized> Filesystem for Arc<F> {
    async fn read_from(&self, path: &str) -> Result<Bytes> {
        (**self).read_from(path).await
    }

    async fn write_to(&self, path: &str, data: &[u8]) -> Result<()> {
        (**self).write_to(path, data).await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        (**self).remove(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path).await
    }

    async fn size_of(&self, path: &str) -> Result<u64> {
        (**self).size_of(path).await
    }

    async fn listdir(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        (**self).listdir(dir, recursive).await
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        (**self).is_dir(path).await
    }

    async fn copy_to(&self, from: &str, to: &str) -> Result<()> {
        (**self).copy_to(from, to).await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        (**self).mkdir(path).await
    }
}

/// Hash of the live bytes at `path`; a missing file hashes as the tombstone.
pub async fn live_hash<F: Filesystem + ?Sized>(fs: &F, path: &str) -> Result<ContentHash> {
    match fs.read_from(path).await {
        Ok(data) => Ok(ContentHash::of(&data)),
        Err(StoreError::NotFound(_)) => Ok(ContentHash::Deleted),
        Err(e) => Err(e),
    }
}

/// Join a root-relative directory and a child name.
pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Behaviour every implementation must share.
    async fn exercise<F: Filesystem>(fs: F) {
        assert!(!fs.exists("a/b/c.txt").await.unwrap());
        fs.write_to("a/b/c.txt", b"hello").await.unwrap();
        fs.write_to("top.txt", b"x").await.unwrap();

        assert!(fs.exists("a/b/c.txt").await.unwrap());
        assert!(fs.is_dir("a/b").await.unwrap());
        assert!(!fs.is_dir("a/b/c.txt").await.unwrap());
        assert_eq!(fs.size_of("a/b/c.txt").await.unwrap(), 5);
        assert_eq!(&fs.read_from("a/b/c.txt").await.unwrap()[..], b"hello");

        assert_eq!(
            fs.listdir("", true).await.unwrap(),
            vec!["a/b/c.txt".to_string(), "top.txt".to_string()]
        );
        assert_eq!(fs.listdir("", false).await.unwrap(), vec!["top.txt".to_string()]);
        assert_eq!(fs.listdir("a", true).await.unwrap(), vec!["a/b/c.txt".to_string()]);

        fs.copy_to("a/b/c.txt", "copy/c.txt").await.unwrap();
        assert_eq!(&fs.read_from("copy/c.txt").await.unwrap()[..], b"hello");

        fs.remove("a/b/c.txt").await.unwrap();
        assert!(!fs.exists("a/b/c.txt").await.unwrap());
        assert!(matches!(
            fs.remove("a/b/c.txt").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            fs.read_from("a/b/c.txt").await,
            Err(StoreError::NotFound(_))
        ));

        fs.mkdir("empty/dir").await.unwrap();
        assert!(fs.is_dir("empty/dir").await.unwrap());
        assert!(!fs.listdir("", true).await.unwrap().iter().any(|p| p.starts_with("empty")));

        assert!(matches!(
            fs.write_to("../escape.txt", b"no").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_filesystem_contract() {
        exercise(MemoryFilesystem::new()).await;
    }

    #[tokio::test]
    async fn test_local_filesystem_contract() {
        let dir = tempfile::tempdir().unwrap();
        exercise(LocalFilesystem::new(dir.path())).await;
    }

    #[tokio::test]
    async fn test_live_hash_of_missing_file_is_tombstone() {
        let fs = MemoryFilesystem::new();
        assert_eq!(live_hash(&fs, "nope").await.unwrap(), ContentHash::Deleted);
        fs.write_to("yes", b"1").await.unwrap();
        assert_eq!(live_hash(&fs, "yes").await.unwrap(), ContentHash::of(b"1"));
    }
}
