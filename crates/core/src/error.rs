use thiserror::Error;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file name must contain an extension: {0:?}")]
    MissingExtension(String),

    #[error("page must be at least 1 and page size non-negative (page {page}, size {size})")]
    InvalidPage { page: i64, size: i64 },

    #[error("object not found: {0}")]
    NotFound(String),

    /// Any failure reported by the backend SDK or its transport.
    #[error("{backend} backend failure: {source:#}")]
    Backend {
        backend: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Backend,
    Config,
}

impl StorageError {
    pub fn backend(backend: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            backend,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingExtension(_) | Self::InvalidPage { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
