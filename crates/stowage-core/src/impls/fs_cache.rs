//! FsCacheStore - ローカルファイルシステム上のアップロードキャッシュ

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{CacheError, CacheStore, CachedFile};

#[derive(Debug, Clone, Copy, Default)]
pub struct FsCacheStore;

impl FsCacheStore {
    pub fn new() -> Self {
        Self
    }
}

fn cache_error(path: &Path, err: io::Error) -> CacheError {
    if err.kind() == io::ErrorKind::NotFound {
        CacheError::Missing(path.to_path_buf())
    } else {
        CacheError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn open(&self, path: &Path) -> Result<CachedFile, CacheError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| cache_error(path, err))?;
        debug!(path = %path.display(), len = bytes.len(), "cache file opened");
        Ok(CachedFile::new(path, bytes))
    }

    async fn remove(&self, path: &Path) -> Result<(), CacheError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|err| cache_error(path, err))
    }
}
