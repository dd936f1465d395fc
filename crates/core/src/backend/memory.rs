use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::file::StorageFile;
use crate::path::StoragePath;
use crate::service::StorageService;

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    content: Bytes,
}

/// Process-local bucket. Keys list in lexicographic order, as S3 does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn find(&self, name: &str) -> Result<Option<StorageFile>> {
        let objects = self.objects.read().await;
        Ok(objects.get(name).map(|object| {
            StorageFile::from_key(name, object.content_type.clone(), object.content.clone())
        }))
    }

    async fn exists(&self, name: &str) -> bool {
        self.objects.read().await.contains_key(name)
    }

    async fn save(&self, file: StorageFile) -> Result<StoragePath> {
        let key = file.key();
        let object = StoredObject {
            content_type: file.content_type().to_string(),
            content: file.into_content(),
        };
        debug!(key = %key, bytes = object.content.len(), "memory PUT");
        self.objects.write().await.insert(key.clone(), object);
        Ok(StoragePath::new(&key))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects.write().await.remove(name);
        Ok(())
    }

    async fn list_keys(&self, path: &StoragePath) -> Result<Vec<String>> {
        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|key| path.contains_key(key))
            .cloned()
            .collect())
    }
}
