//! One file-storage contract over Firebase Storage, MinIO and AWS S3.
//!
//! Pick an adapter from [`backend`] (or build one from a [`Config`]) and use
//! it through [`StorageService`]; switching backend leaves calling code as is.

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod page;
pub mod path;
pub mod service;

pub use config::{Config, StorageConfig};
pub use error::{ErrorKind, Result, StorageError};
pub use file::StorageFile;
pub use page::Page;
pub use path::{StoragePath, join_key};
pub use service::StorageService;
