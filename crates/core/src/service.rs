use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::file::StorageFile;
use crate::page::Page;
use crate::path::{StoragePath, join_key};

/// Uniform file operations over a single bucket.
///
/// Lookups of absent objects are not errors: `find` yields `None`,
/// `exists` yields `false` and `delete` does nothing. Anything else the
/// backend reports surfaces as [`StorageError::Backend`].
///
/// [`StorageError::Backend`]: crate::StorageError::Backend
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Fetches the object stored under `name`, content fully buffered.
    async fn find(&self, name: &str) -> Result<Option<StorageFile>>;

    /// Metadata-only probe. Probe failures count as absent.
    async fn exists(&self, name: &str) -> bool;

    /// Writes `file` under [`StorageFile::key`], replacing any previous
    /// object, and returns that key.
    async fn save(&self, file: StorageFile) -> Result<StoragePath>;

    async fn delete(&self, name: &str) -> Result<()>;

    /// Every key under `path` (see [`StoragePath::contains_key`]),
    /// recursively and in listing order.
    async fn list_keys(&self, path: &StoragePath) -> Result<Vec<String>>;

    async fn find_in(&self, name: &str, path: &StoragePath) -> Result<Option<StorageFile>> {
        self.find(&join_key(Some(path), Some(name))).await
    }

    async fn exists_in(&self, name: &str, path: &StoragePath) -> bool {
        self.exists(&join_key(Some(path), Some(name))).await
    }

    async fn delete_in(&self, name: &str, path: &StoragePath) -> Result<()> {
        self.delete(&join_key(Some(path), Some(name))).await
    }

    /// Files under `path` inside the `page` window of the listing.
    async fn find_all(&self, path: &StoragePath, page: Page) -> Result<Vec<StorageFile>> {
        let keys = self.list_keys(path).await?;
        let window = page.window(&keys);
        debug!(
            path = %path,
            listed = keys.len(),
            offset = page.offset(),
            selected = window.len(),
            "listing page"
        );
        let mut files = Vec::with_capacity(window.len());
        for key in window {
            match self.find(key).await? {
                Some(file) => files.push(file),
                None => warn!(key = %key, "object disappeared between list and fetch"),
            }
        }
        Ok(files)
    }

    /// Removes every object under `path`, one request per key.
    async fn delete_all(&self, path: &StoragePath) -> Result<()> {
        let keys = self.list_keys(path).await?;
        debug!(path = %path, count = keys.len(), "deleting folder");
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}
