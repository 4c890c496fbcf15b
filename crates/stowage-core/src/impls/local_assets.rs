//! LocalUploader - ローカルディスクに保存するアップロードフィールド
//!
//! # レイアウト（すべて `root` からの相対パス）
//! - 本保存: `<store_dir>/<field>/<record id>/<file name>`
//! - キャッシュ: `<cache_dir>/<token>/<file name>`（token は ULID）
//! - バージョン: 本保存ファイルと同じディレクトリに `<version>_<file name>`
//!
//! フィールドの値には `root` からの相対パスを、`<field>_tmp` には
//! `cache_dir` からの相対パスを書く。
//!
//! バージョン生成はバイトコピーのみ（画像変換はしない）。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::config::UploadsConfig;
use crate::domain::{FieldName, SaveMode};
use crate::ports::{AssetAccessor, AssetError, CachedFile, Record};

pub struct LocalUploader {
    config: UploadsConfig,
    mounted: BTreeSet<FieldName>,
}

impl LocalUploader {
    pub fn new(config: UploadsConfig) -> Self {
        Self {
            config,
            mounted: BTreeSet::new(),
        }
    }

    /// Mount the uploader on an asset field.
    pub fn mount(mut self, field: impl Into<FieldName>) -> Self {
        self.mounted.insert(field.into());
        self
    }

    fn ensure_mounted(&self, field: &FieldName) -> Result<(), AssetError> {
        if self.mounted.contains(field) {
            Ok(())
        } else {
            Err(AssetError::NotMounted(field.clone()))
        }
    }

    fn version_path(original: &Path, version: &str) -> Option<PathBuf> {
        let name = original.file_name()?.to_str()?;
        Some(original.with_file_name(format!("{version}_{name}")))
    }

    async fn write_versions(&self, original: &Path) -> Result<(), AssetError> {
        for version in &self.config.versions {
            let Some(target) = Self::version_path(original, version) else {
                continue;
            };
            tokio::fs::copy(original, &target).await?;
            debug!(version = %version, path = %target.display(), "version written");
        }
        Ok(())
    }

    async fn store<R: Record>(
        &self,
        record: &mut R,
        field: &FieldName,
        file: &CachedFile,
        name: &str,
    ) -> Result<(), AssetError> {
        let relative = self
            .config
            .store_dir
            .join(field.as_str())
            .join(record.id().as_str())
            .join(name);
        let target = self.config.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &file.bytes).await?;
        self.write_versions(&target).await?;

        record.set_attribute(
            field.as_str(),
            Value::String(relative.to_string_lossy().into_owned()),
        );
        debug!(record_id = %record.id(), field = %field, path = %target.display(), "asset stored");
        Ok(())
    }

    async fn cache<R: Record>(
        &self,
        record: &mut R,
        field: &FieldName,
        file: &CachedFile,
        name: &str,
    ) -> Result<(), AssetError> {
        let tmp_name = Path::new(&Ulid::new().to_string()).join(name);
        let target = self.config.root.join(&self.config.cache_dir).join(&tmp_name);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &file.bytes).await?;

        record.set_attribute(
            &field.tmp_attribute(),
            Value::String(tmp_name.to_string_lossy().into_owned()),
        );
        debug!(record_id = %record.id(), field = %field, path = %target.display(), "asset cached");
        Ok(())
    }
}

#[async_trait]
impl<R: Record> AssetAccessor<R> for LocalUploader {
    fn root(&self, _record: &R, _field: &FieldName) -> PathBuf {
        self.config.root.clone()
    }

    fn cache_dir(&self, _record: &R, _field: &FieldName) -> PathBuf {
        self.config.cache_dir.clone()
    }

    async fn recreate_versions(
        &self,
        record: &mut R,
        field: &FieldName,
        _mode: SaveMode,
    ) -> Result<bool, AssetError> {
        self.ensure_mounted(field)?;

        let Some(stored) = record
            .attribute(field.as_str())
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
        else {
            warn!(record_id = %record.id(), field = %field, "nothing stored to recreate versions from");
            return Ok(false);
        };

        let original = self.config.root.join(stored);
        if !tokio::fs::try_exists(&original).await? {
            warn!(record_id = %record.id(), path = %original.display(), "stored file is missing");
            return Ok(false);
        }

        self.write_versions(&original).await?;
        Ok(true)
    }

    async fn assign(
        &self,
        record: &mut R,
        field: &FieldName,
        file: CachedFile,
        mode: SaveMode,
    ) -> Result<(), AssetError> {
        self.ensure_mounted(field)?;
        let name = file.file_name().unwrap_or("upload").to_owned();

        match mode {
            SaveMode::Inline => self.store(record, field, &file, &name).await,
            SaveMode::Deferred => self.cache(record, field, &file, &name).await,
        }
    }
}
