use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::{FirebaseStorage, MemoryStorage, MinioStorage, S3Storage, StaticToken};
use crate::service::StorageService;

const CONFIG_FILE: &str = "storekit.toml";
const CONFIG_ENV: &str = "STOREKIT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    #[serde(rename = "firebase")]
    Firebase {
        bucket: String,
        access_token: String,
        endpoint: Option<String>,
    },
    #[serde(rename = "minio")]
    Minio {
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        region: Option<String>,
    },
    #[serde(rename = "s3")]
    S3 {
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        endpoint: Option<String>,
    },
    #[serde(rename = "memory")]
    Memory,
}

impl Config {
    /// `$STOREKIT_CONFIG`, or `storekit/storekit.toml` in the user config dir.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storekit")
            .join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config")
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Firebase { .. } => "firebase",
            Self::Minio { .. } => "minio",
            Self::S3 { .. } => "s3",
            Self::Memory => "memory",
        }
    }

    /// Connects the configured adapter, ensuring its bucket on the way.
    pub async fn open(&self) -> Result<Arc<dyn StorageService>> {
        let storage: Arc<dyn StorageService> = match self {
            Self::Firebase {
                bucket,
                access_token,
                endpoint,
            } => Arc::new(
                FirebaseStorage::connect(
                    endpoint.as_deref(),
                    StaticToken::new(access_token.clone()),
                    bucket,
                )
                .await?,
            ),
            Self::Minio {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => Arc::new(match region {
                Some(region) => {
                    MinioStorage::connect_with_region(
                        endpoint, region, access_key, secret_key, bucket,
                    )
                    .await?
                }
                None => MinioStorage::connect(endpoint, access_key, secret_key, bucket).await?,
            }),
            Self::S3 {
                region,
                bucket,
                access_key,
                secret_key,
                endpoint,
            } => Arc::new(
                S3Storage::connect(access_key, secret_key, region, endpoint.as_deref(), bucket)
                    .await?,
            ),
            Self::Memory => Arc::new(MemoryStorage::new()),
        };
        tracing::info!(backend = self.backend_name(), "storage opened");
        Ok(storage)
    }
}
