use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::file::StorageFile;
use crate::path::StoragePath;
use crate::service::StorageService;

const BACKEND: &str = "firebase";
const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Supplies the OAuth bearer token sent with every request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> anyhow::Result<String>;
}

/// A token obtained elsewhere, used until the adapter is dropped.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

/// Firebase Storage bucket, reached through the Cloud Storage JSON API.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    endpoint: Url,
    bucket: String,
}

impl FirebaseStorage {
    pub fn new(tokens: impl TokenSource + 'static, bucket: &str) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, tokens, bucket)
    }

    /// Targets another server speaking the same API, such as the Firebase
    /// emulator.
    pub fn with_endpoint(
        endpoint: &str,
        tokens: impl TokenSource + 'static,
        bucket: &str,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid Firebase endpoint: {endpoint}"))
            .map_err(failure)?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "Firebase endpoint cannot be a base URL: {endpoint}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to build HTTP client")
            .map_err(failure)?;
        Ok(Self {
            http,
            tokens: Arc::new(tokens),
            endpoint,
            bucket: bucket.to_string(),
        })
    }

    /// Like [`FirebaseStorage::with_endpoint`], then checks that the bucket
    /// exists. Firebase buckets belong to a project and are not created here.
    pub async fn connect(
        endpoint: Option<&str>,
        tokens: impl TokenSource + 'static,
        bucket: &str,
    ) -> Result<Self> {
        let storage = Self::with_endpoint(endpoint.unwrap_or(DEFAULT_ENDPOINT), tokens, bucket)?;
        let url = storage.url(&["storage", "v1", "b", bucket]);
        if storage.send(storage.http.get(url), "bucket GET", bucket).await?.is_none() {
            return Err(StorageError::Config(format!(
                "Firebase bucket does not exist: {bucket}"
            )));
        }
        Ok(storage)
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // Checked in `with_endpoint`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Object keys travel as one percent-encoded path segment.
    fn object_url(&self, key: &str) -> Url {
        self.url(&["storage", "v1", "b", self.bucket.as_str(), "o", key])
    }

    /// Sends an authorized request. `None` means the server answered 404.
    async fn send(&self, request: RequestBuilder, op: &str, key: &str) -> Result<Option<Response>> {
        let token = self
            .tokens
            .token()
            .await
            .context("failed to obtain Firebase access token")
            .map_err(failure)?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Firebase {op} failed: {key}"))
            .map_err(failure)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(anyhow!("Firebase {op} {key} returned {status}: {body}")));
        }
        Ok(Some(response))
    }
}

#[async_trait]
impl StorageService for FirebaseStorage {
    async fn find(&self, name: &str) -> Result<Option<StorageFile>> {
        let request = self.http.get(self.object_url(name)).query(&[("alt", "media")]);
        let Some(response) = self.send(request, "GET", name).await? else {
            debug!(key = %name, "Firebase GET: not found");
            return Ok(None);
        };
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content = response
            .bytes()
            .await
            .with_context(|| format!("Firebase GET body read failed: {name}"))
            .map_err(failure)?;
        debug!(key = %name, bytes = content.len(), "Firebase GET");
        Ok(Some(StorageFile::from_key(name, content_type, content)))
    }

    async fn exists(&self, name: &str) -> bool {
        let request = self.http.get(self.object_url(name));
        match self.send(request, "metadata GET", name).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                debug!(key = %name, error = %err, "Firebase metadata GET failed, treating as absent");
                false
            }
        }
    }

    async fn save(&self, file: StorageFile) -> Result<StoragePath> {
        let key = file.key();
        let url = self.url(&["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        let content_type = file.content_type().to_string();
        let content = file.into_content();
        let size = content.len();
        let request = self
            .http
            .post(url)
            .query(&[("uploadType", "media"), ("name", key.as_str())])
            .header(CONTENT_TYPE, content_type)
            .body(content);
        if self.send(request, "upload", &key).await?.is_none() {
            return Err(failure(anyhow!(
                "Firebase upload {key} returned 404: bucket {} not found",
                self.bucket
            )));
        }
        debug!(key = %key, bytes = size, "Firebase upload");
        Ok(StoragePath::new(&key))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let request = self.http.delete(self.object_url(name));
        if self.send(request, "DELETE", name).await?.is_some() {
            debug!(key = %name, "Firebase DELETE");
        }
        Ok(())
    }

    async fn list_keys(&self, path: &StoragePath) -> Result<Vec<String>> {
        let prefix = path.to_string();
        let url = self.url(&["storage", "v1", "b", self.bucket.as_str(), "o"]);
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.http.get(url.clone());
            if !path.is_root() {
                request = request.query(&[("prefix", prefix.as_str())]);
            }
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let Some(response) = self.send(request, "LIST", &prefix).await? else {
                return Err(failure(anyhow!(
                    "Firebase LIST {prefix} returned 404: bucket {} not found",
                    self.bucket
                )));
            };
            let page: ObjectList = response
                .json()
                .await
                .with_context(|| format!("failed to parse Firebase listing: {prefix}"))
                .map_err(failure)?;
            keys.extend(
                page.items
                    .into_iter()
                    .map(|item| item.name)
                    .filter(|key| path.contains_key(key)),
            );
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(keys)
    }
}

fn failure(err: anyhow::Error) -> StorageError {
    StorageError::backend(BACKEND, err)
}
