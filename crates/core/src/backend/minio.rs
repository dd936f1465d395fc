use anyhow::{Context, anyhow};
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::bucket_ops::BucketConfiguration;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::request::ResponseData;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::file::StorageFile;
use crate::path::StoragePath;
use crate::service::StorageService;

const BACKEND: &str = "minio";
const DEFAULT_REGION: &str = "us-east-1";

/// Self-hosted S3-compatible store, addressed with path-style URLs.
#[derive(Debug)]
pub struct MinioStorage {
    bucket: Box<Bucket>,
    bucket_name: String,
    region: Region,
    credentials: Credentials,
}

impl MinioStorage {
    pub fn new(server_url: &str, access_key: &str, secret_key: &str, bucket: &str) -> Result<Self> {
        Self::with_region(server_url, DEFAULT_REGION, access_key, secret_key, bucket)
    }

    pub fn with_region(
        server_url: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket_name: &str,
    ) -> Result<Self> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: server_url.trim_end_matches('/').to_string(),
        };
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .context("invalid MinIO credentials")
            .map_err(failure)?;
        let bucket = Bucket::new(bucket_name, region.clone(), credentials.clone())
            .with_context(|| format!("invalid MinIO bucket: {bucket_name}"))
            .map_err(failure)?
            .with_path_style();
        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            region,
            credentials,
        })
    }

    /// Like [`MinioStorage::new`], then creates the bucket if it is missing.
    pub async fn connect(
        server_url: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Result<Self> {
        Self::connect_with_region(server_url, DEFAULT_REGION, access_key, secret_key, bucket).await
    }

    pub async fn connect_with_region(
        server_url: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Result<Self> {
        let storage = Self::with_region(server_url, region, access_key, secret_key, bucket)?;
        storage.ensure_bucket().await?;
        Ok(storage)
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn client(&self) -> &Bucket {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> Result<()> {
        let found = self
            .bucket
            .exists()
            .await
            .with_context(|| format!("MinIO bucket check failed: {}", self.bucket_name))
            .map_err(failure)?;
        if found {
            return Ok(());
        }
        let response = Bucket::create_with_path_style(
            &self.bucket_name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .with_context(|| format!("MinIO bucket creation failed: {}", self.bucket_name))
        .map_err(failure)?;
        // 409: created concurrently by someone else
        if !response.success() && response.response_code != 409 {
            return Err(failure(anyhow!(
                "MinIO bucket creation failed: {} returned {}: {}",
                self.bucket_name,
                response.response_code,
                response.response_text
            )));
        }
        info!(bucket = %self.bucket_name, "bucket created");
        Ok(())
    }

    /// `None` when the object is gone by the time the HEAD arrives.
    async fn content_type(&self, key: &str) -> Result<Option<String>> {
        match self.bucket.head_object(key).await {
            Ok((_, 404)) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Ok((head, status)) if (200..300).contains(&status) => {
                Ok(Some(head.content_type.unwrap_or_default()))
            }
            Ok((_, status)) => Err(failure(anyhow!("MinIO HEAD {key} returned {status}"))),
            Err(err) => Err(failure(
                anyhow::Error::new(err).context(format!("MinIO HEAD failed: {key}")),
            )),
        }
    }
}

#[async_trait]
impl StorageService for MinioStorage {
    async fn find(&self, name: &str) -> Result<Option<StorageFile>> {
        let Some(response) = check("GET", name, self.bucket.get_object(name).await)? else {
            debug!(key = %name, "MinIO GET: not found");
            return Ok(None);
        };
        let Some(content_type) = self.content_type(name).await? else {
            debug!(key = %name, "MinIO HEAD: removed after GET");
            return Ok(None);
        };
        debug!(key = %name, bytes = response.bytes().len(), "MinIO GET");
        Ok(Some(StorageFile::from_key(
            name,
            content_type,
            response.bytes().clone(),
        )))
    }

    async fn exists(&self, name: &str) -> bool {
        match self.bucket.head_object(name).await {
            Ok((_, status)) => status == 200,
            Err(err) => {
                debug!(key = %name, error = %err, "MinIO HEAD failed, treating as absent");
                false
            }
        }
    }

    async fn save(&self, file: StorageFile) -> Result<StoragePath> {
        let key = file.key();
        let result = self
            .bucket
            .put_object_with_content_type(&key, file.content(), file.content_type())
            .await;
        if check("PUT", &key, result)?.is_none() {
            return Err(failure(anyhow!("MinIO PUT {key} returned 404")));
        }
        debug!(key = %key, bytes = file.content().len(), "MinIO PUT");
        Ok(StoragePath::new(&key))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        check("DELETE", name, self.bucket.delete_object(name).await)?;
        debug!(key = %name, "MinIO DELETE");
        Ok(())
    }

    async fn list_keys(&self, path: &StoragePath) -> Result<Vec<String>> {
        let prefix = path.to_string();
        // No delimiter: the listing descends into every sub-folder.
        let results = self
            .bucket
            .list(prefix.clone(), None)
            .await
            .with_context(|| format!("MinIO LIST failed: {prefix}"))
            .map_err(failure)?;
        Ok(results
            .into_iter()
            .flat_map(|result| result.contents)
            .map(|object| object.key)
            .filter(|key| path.contains_key(key))
            .collect())
    }
}

/// Sorts a response into found, not found (`None`) or failed. Covers both
/// builds of the SDK: with `fail-on-err` non-2xx answers arrive as
/// `HttpFailWithBody`, without it they come back as plain responses.
fn check(
    op: &str,
    key: &str,
    result: std::result::Result<ResponseData, S3Error>,
) -> Result<Option<ResponseData>> {
    match result {
        Ok(response) if response.status_code() == 404 => Ok(None),
        Ok(response) if (200..300).contains(&response.status_code()) => Ok(Some(response)),
        Ok(response) => Err(failure(anyhow!(
            "MinIO {op} {key} returned {}: {}",
            response.status_code(),
            String::from_utf8_lossy(response.bytes())
        ))),
        Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
        Err(err) => Err(failure(
            anyhow::Error::new(err).context(format!("MinIO {op} failed: {key}")),
        )),
    }
}

fn failure(err: anyhow::Error) -> StorageError {
    StorageError::backend(BACKEND, err)
}
