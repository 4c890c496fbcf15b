//! AssetAccessor port - アップロードフィールドの抽象化
//!
//! 列ごとにメソッドを生やす代わりに、`FieldName` を引数に取る accessor を
//! 1 つだけ用意する。キャッシュのレイアウト、バージョン生成、ファイル移動は
//! すべて実装側が持つ。

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::cache_store::CachedFile;
use super::record_store::Record;
use crate::domain::{FieldName, SaveMode};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no uploader mounted on field '{0}'")]
    NotMounted(FieldName),

    #[error("asset io: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AssetAccessor<R: Record>: Send + Sync {
    /// Base directory of the uploader for this field.
    fn root(&self, record: &R, field: &FieldName) -> PathBuf;

    /// Cache directory relative to [`AssetAccessor::root`].
    fn cache_dir(&self, record: &R, field: &FieldName) -> PathBuf;

    /// Recreate every derived version from the stored original.
    ///
    /// `Ok(false)` はバージョン生成が失敗したことを表す（エラーではなく結果）。
    async fn recreate_versions(
        &self,
        record: &mut R,
        field: &FieldName,
        mode: SaveMode,
    ) -> Result<bool, AssetError>;

    /// Assign a file as the field's new value.
    ///
    /// - `Inline`: store it permanently now.
    /// - `Deferred`: keep it in the cache and write `<field>_tmp` for a later store job.
    async fn assign(
        &self,
        record: &mut R,
        field: &FieldName,
        file: CachedFile,
        mode: SaveMode,
    ) -> Result<(), AssetError>;
}
