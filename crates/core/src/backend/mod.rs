pub mod firebase;
pub mod memory;
pub mod minio;
pub mod s3;

pub use firebase::{FirebaseStorage, StaticToken, TokenSource};
pub use memory::MemoryStorage;
pub use minio::MinioStorage;
pub use s3::S3Storage;
