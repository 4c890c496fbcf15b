//! CacheStore port - アップロードキャッシュの読み出しと削除

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file missing: {0}")]
    Missing(PathBuf),

    /// `<field>_tmp` does not name a file below the cache directory.
    #[error("invalid cache file name: {0:?}")]
    InvalidName(String),

    #[error("cache io on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An opened cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub path: PathBuf,
    pub bytes: Bytes,
}

impl CachedFile {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Final path component, used as the stored file name.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn open(&self, path: &Path) -> Result<CachedFile, CacheError>;

    async fn remove(&self, path: &Path) -> Result<(), CacheError>;
}
