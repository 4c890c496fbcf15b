//! Test doubles shared by the job tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::domain::{FieldName, RecordId, SaveMode};
use crate::impls::{DocumentRecord, InMemoryDocumentStore};
use crate::ports::{AssetAccessor, AssetError, CacheError, CacheStore, CachedFile, Record};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AssetCall {
    Recreate {
        record_id: RecordId,
        field: FieldName,
        mode: SaveMode,
    },
    Assign {
        record_id: RecordId,
        field: FieldName,
        path: PathBuf,
        bytes: Bytes,
        mode: SaveMode,
    },
}

/// Asset accessor whose regeneration result is fixed up front.
pub(crate) struct ScriptedAssets {
    root: PathBuf,
    cache_dir: PathBuf,
    regenerate: bool,
    calls: Mutex<Vec<AssetCall>>,
}

impl ScriptedAssets {
    pub(crate) fn new(root: &str, cache_dir: &str, regenerate: bool) -> Self {
        Self {
            root: PathBuf::from(root),
            cache_dir: PathBuf::from(cache_dir),
            regenerate,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<AssetCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetAccessor<DocumentRecord> for ScriptedAssets {
    fn root(&self, _record: &DocumentRecord, _field: &FieldName) -> PathBuf {
        self.root.clone()
    }

    fn cache_dir(&self, _record: &DocumentRecord, _field: &FieldName) -> PathBuf {
        self.cache_dir.clone()
    }

    async fn recreate_versions(
        &self,
        record: &mut DocumentRecord,
        field: &FieldName,
        mode: SaveMode,
    ) -> Result<bool, AssetError> {
        self.calls.lock().unwrap().push(AssetCall::Recreate {
            record_id: record.id().clone(),
            field: field.clone(),
            mode,
        });
        Ok(self.regenerate)
    }

    async fn assign(
        &self,
        record: &mut DocumentRecord,
        field: &FieldName,
        file: CachedFile,
        mode: SaveMode,
    ) -> Result<(), AssetError> {
        let stored = format!("stored/{}", file.file_name().unwrap_or("upload"));
        record.set_attribute(field.as_str(), json!(stored));
        self.calls.lock().unwrap().push(AssetCall::Assign {
            record_id: record.id().clone(),
            field: field.clone(),
            path: file.path,
            bytes: file.bytes,
            mode,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CacheEvent {
    Opened(PathBuf),
    /// `saves_before` is the store's save count when the removal happened.
    Removed { path: PathBuf, saves_before: usize },
}

/// Cache store backed by a map, recording every open/remove.
pub(crate) struct RecordingCache {
    store: InMemoryDocumentStore,
    files: Mutex<HashMap<PathBuf, Bytes>>,
    events: Mutex<Vec<CacheEvent>>,
    fail_removes: AtomicBool,
}

impl RecordingCache {
    pub(crate) fn new(store: InMemoryDocumentStore) -> Self {
        Self {
            store,
            files: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            fail_removes: AtomicBool::new(false),
        }
    }

    /// Make every `remove` fail with an io error, leaving the file in place.
    pub(crate) fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn with_file(self, path: &str, bytes: &'static [u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), Bytes::from_static(bytes));
        self
    }

    pub(crate) fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(Path::new(path))
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn open(&self, path: &Path) -> Result<CachedFile, CacheError> {
        self.events
            .lock()
            .unwrap()
            .push(CacheEvent::Opened(path.to_path_buf()));
        let bytes = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| CacheError::Missing(path.to_path_buf()))?;
        Ok(CachedFile::new(path, bytes))
    }

    async fn remove(&self, path: &Path) -> Result<(), CacheError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only cache"),
            });
        }
        let saves_before = self.store.save_count().await;
        self.events.lock().unwrap().push(CacheEvent::Removed {
            path: path.to_path_buf(),
            saves_before,
        });
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| CacheError::Missing(path.to_path_buf()))
    }
}
