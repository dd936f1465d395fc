use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::file::StorageFile;
use crate::path::StoragePath;
use crate::service::StorageService;

const BACKEND: &str = "s3";
// Buckets in this region are created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// AWS S3, or any endpoint speaking its API when `endpoint` is set.
#[derive(Clone, Debug)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Storage {
    pub fn new(
        access_key: &str,
        secret_key: &str,
        region: &str,
        endpoint: Option<&str>,
        bucket: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "storekit");
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            region: region.to_string(),
        }
    }

    /// Like [`S3Storage::new`], then creates the bucket if it is missing.
    pub async fn connect(
        access_key: &str,
        secret_key: &str,
        region: &str,
        endpoint: Option<&str>,
        bucket: &str,
    ) -> Result<Self> {
        let storage = Self::new(access_key, secret_key, region, endpoint, bucket);
        storage.ensure_bucket().await?;
        Ok(storage)
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn ensure_bucket(&self) -> Result<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        match request.send().await {
            Ok(_) => {
                info!(bucket = %self.bucket, region = %self.region, "bucket created");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Ok(())
            }
            Err(err) => Err(failure(err, format!("S3 bucket creation failed: {}", self.bucket))),
        }
    }
}

#[async_trait]
impl StorageService for S3Storage {
    async fn find(&self, name: &str) -> Result<Option<StorageFile>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                debug!(key = %name, "S3 GET: not found");
                return Ok(None);
            }
            Err(err) => return Err(failure(err, format!("S3 GET failed: {name}"))),
        };
        let content_type = output.content_type().unwrap_or_default().to_string();
        let data = output
            .body
            .collect()
            .await
            .with_context(|| format!("S3 GET body read failed: {name}"))
            .map_err(|e| StorageError::backend(BACKEND, e))?;
        let content = data.into_bytes();
        debug!(key = %name, bytes = content.len(), "S3 GET");
        Ok(Some(StorageFile::from_key(name, content_type, content)))
    }

    async fn exists(&self, name: &str) -> bool {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => true,
            Err(err) => {
                debug!(key = %name, error = %DisplayErrorContext(&err), "S3 HEAD failed, treating as absent");
                false
            }
        }
    }

    async fn save(&self, file: StorageFile) -> Result<StoragePath> {
        let key = file.key();
        let content_type = file.content_type().to_string();
        let content = file.into_content();
        let size = content.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|err| failure(err, format!("S3 PUT failed: {key}")))?;
        debug!(key = %key, bytes = size, "S3 PUT");
        Ok(StoragePath::new(&key))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => {
                debug!(key = %name, "S3 DELETE");
                Ok(())
            }
            Err(err)
                if err
                    .raw_response()
                    .is_some_and(|response| response.status().as_u16() == 404) =>
            {
                Ok(())
            }
            Err(err) => Err(failure(err, format!("S3 DELETE failed: {name}"))),
        }
    }

    async fn list_keys(&self, path: &StoragePath) -> Result<Vec<String>> {
        let prefix = path.to_string();
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| failure(err, format!("S3 LIST failed: {prefix}")))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| path.contains_key(key))
                    .map(String::from),
            );
            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        Ok(keys)
    }
}

fn failure<E: std::error::Error>(err: E, context: String) -> StorageError {
    StorageError::backend(
        BACKEND,
        anyhow::anyhow!("{context}: {}", DisplayErrorContext(&err)),
    )
}
