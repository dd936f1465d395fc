use bytes::Bytes;

use crate::error::{Result, StorageError};
use crate::path::StoragePath;

/// A file to store, or one read back from a bucket.
///
/// The last segment of `path + name` is always the file name, so
/// `("c.txt", Some("a/b"))` and `("a/b/c.txt", None)` describe the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFile {
    path: Option<StoragePath>,
    file_name: String,
    key: String,
    content_type: String,
    content: Bytes,
}

impl StorageFile {
    pub fn new(
        file_name: &str,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Result<Self> {
        Self::with_path(file_name, None, content_type, content)
    }

    pub fn with_path(
        file_name: &str,
        path: Option<StoragePath>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Result<Self> {
        let full = path.unwrap_or_default().join(file_name);
        let file = Self::split(&full, full.to_string(), content_type.into(), content.into());
        if !has_extension(&file.file_name) {
            return Err(StorageError::MissingExtension(file.file_name));
        }
        Ok(file)
    }

    /// Builds a file from a full backend key without checking the extension;
    /// objects written by other clients may not have one.
    ///
    /// The key is kept verbatim, so a listed `a//b.txt` still addresses its
    /// object even though `path()` reports the normalized `a`.
    pub(crate) fn from_key(key: &str, content_type: String, content: Bytes) -> Self {
        Self::split(&StoragePath::new(key), key.to_string(), content_type, content)
    }

    fn split(full: &StoragePath, key: String, content_type: String, content: Bytes) -> Self {
        Self {
            file_name: full.file_name().unwrap_or_default().to_string(),
            path: full.parent(),
            key,
            content_type,
            content,
        }
    }

    pub fn path(&self) -> Option<&StoragePath> {
        self.path.as_ref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    /// Key this file is stored under.
    pub fn key(&self) -> String {
        self.key.clone()
    }
}

fn has_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, extension)| !extension.is_empty())
}
