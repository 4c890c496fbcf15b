//! StoreAssetHandler - キャッシュ済みアップロードを本保存に昇格させる
//!
//! # 手順
//! 1. descriptor からレコードを解決
//! 2. `<field>_tmp` を読む。空なら何もしないで成功（冪等な short-circuit）
//! 3. `root / cache_dir / tmp_name` でキャッシュファイルのパスを組み立てる
//! 4. `SaveMode::Inline` でキャッシュファイルをフィールドに assign（ここで本保存される）
//! 5. `<field>_tmp` をクリアしてフル save
//! 6. save が成功した場合に限りキャッシュファイルを削除
//!
//! save が失敗したらキャッシュファイルは残す。リトライ時に同じバイト列から
//! やり直せるよう、保存が確定するまではキャッシュが正本。
//!
//! save 後の削除に失敗しても job は成功扱い（`<field>_tmp` はもう空なので、
//! リトライしても skip になるだけ）。残ったパスは `LeftoverCacheFile` に載せる。
//!
//! tmp 名は `cache_dir` 配下の相対パスに限る。絶対パスや `..` を含む名前は
//! `CacheError::InvalidName` で拒否し、ファイルには一切触らない。

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::locator::RecordLocator;
use crate::domain::{Artifact, AssetJobError, FieldName, JobDescriptor, Outcome, SaveMode};
use crate::ports::{AssetAccessor, CacheError, CacheStore, Record, RecordStore};
use crate::typed::{Handler, StoreAsset};

pub struct StoreAssetHandler<S, A, C> {
    locator: RecordLocator<S>,
    assets: Arc<A>,
    cache: Arc<C>,
}

impl<S, A, C> StoreAssetHandler<S, A, C>
where
    S: RecordStore,
    A: AssetAccessor<S::Record>,
    C: CacheStore,
{
    pub fn new(locator: RecordLocator<S>, assets: Arc<A>, cache: Arc<C>) -> Self {
        Self {
            locator,
            assets,
            cache,
        }
    }

    pub async fn perform(&self, descriptor: &JobDescriptor) -> Result<Outcome, AssetJobError> {
        let mut record = self.locator.resolve(descriptor).await?;
        let field = &descriptor.asset_field;
        let tmp_attribute = field.tmp_attribute();

        let Some(tmp_name) = record
            .attribute(&tmp_attribute)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            debug!(record_id = %record.id(), field = %field, "no cached upload to store");
            return Ok(Outcome::skipped(format!("{tmp_attribute} is empty")));
        };

        let cache_path = self.cache_path(&record, field, &tmp_name)?;
        let mode = SaveMode::Inline;

        let file = self.cache.open(&cache_path).await?;
        self.assets.assign(&mut record, field, file, mode).await?;
        record.set_attribute(&tmp_attribute, Value::Null);

        if let Err(err) = record.save(mode).await {
            warn!(
                record_id = %record.id(),
                cache_path = %cache_path.display(),
                error = %err,
                "save failed, keeping cache file for retry"
            );
            return Err(err.into());
        }

        let stored = cache_path.display().to_string();
        if let Err(err) = self.cache.remove(&cache_path).await {
            warn!(
                record_id = %record.id(),
                cache_path = %stored,
                error = %err,
                "cached upload stored, but cache file could not be removed"
            );
            return Ok(Outcome::success().with_artifact(Artifact::LeftoverCacheFile(stored)));
        }
        info!(record_id = %record.id(), field = %field, cache_path = %stored, "cached upload stored");

        Ok(Outcome::success().with_artifact(Artifact::CacheFile(stored)))
    }

    fn cache_path(
        &self,
        record: &S::Record,
        field: &FieldName,
        tmp_name: &str,
    ) -> Result<PathBuf, CacheError> {
        let relative = Path::new(tmp_name);
        let below_cache_dir = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !below_cache_dir {
            return Err(CacheError::InvalidName(tmp_name.to_string()));
        }

        Ok(self
            .assets
            .root(record, field)
            .join(self.assets.cache_dir(record, field))
            .join(relative))
    }
}

#[async_trait]
impl<S, A, C> Handler<StoreAsset> for StoreAssetHandler<S, A, C>
where
    S: RecordStore + 'static,
    A: AssetAccessor<S::Record> + 'static,
    C: CacheStore + 'static,
{
    async fn handle(&self, task: StoreAsset) -> Result<Outcome, AssetJobError> {
        self.perform(&task.0).await
    }
}
