//! ProcessAssetHandler - 保存済みアセットの派生バージョンを再生成する
//!
//! 1. descriptor からレコードを解決
//! 2. `SaveMode::Inline` で `recreate_versions` を呼ぶ（再 enqueue させない）
//! 3. 成功かつ `<field>_processing` 属性があれば、その属性だけを null に更新
//!
//! 失敗時はマーカーをそのまま残し、`RegenerationFailed` を queue に返す。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::locator::RecordLocator;
use crate::domain::{Artifact, AssetJobError, JobDescriptor, Outcome, SaveMode};
use crate::ports::{AssetAccessor, Record, RecordStore};
use crate::typed::{Handler, ProcessAsset};

pub struct ProcessAssetHandler<S, A> {
    locator: RecordLocator<S>,
    assets: Arc<A>,
}

impl<S, A> ProcessAssetHandler<S, A>
where
    S: RecordStore,
    A: AssetAccessor<S::Record>,
{
    pub fn new(locator: RecordLocator<S>, assets: Arc<A>) -> Self {
        Self { locator, assets }
    }

    pub async fn perform(&self, descriptor: &JobDescriptor) -> Result<Outcome, AssetJobError> {
        let mut record = self.locator.resolve(descriptor).await?;
        let field = &descriptor.asset_field;
        let mode = SaveMode::Inline;

        let regenerated = self
            .assets
            .recreate_versions(&mut record, field, mode)
            .await?;
        if !regenerated {
            warn!(record_id = %record.id(), field = %field, "version regeneration failed");
            return Err(AssetJobError::RegenerationFailed {
                field: field.clone(),
            });
        }

        let marker = field.processing_attribute();
        if !record.has_attribute(&marker) {
            info!(record_id = %record.id(), field = %field, "versions recreated");
            return Ok(Outcome::success());
        }

        record.update_attribute(&marker, Value::Null).await?;
        info!(record_id = %record.id(), field = %field, "versions recreated, processing marker cleared");
        Ok(Outcome::success().with_artifact(Artifact::ClearedAttribute(marker)))
    }
}

#[async_trait]
impl<S, A> Handler<ProcessAsset> for ProcessAssetHandler<S, A>
where
    S: RecordStore + 'static,
    A: AssetAccessor<S::Record> + 'static,
{
    async fn handle(&self, task: ProcessAsset) -> Result<Outcome, AssetJobError> {
        self.perform(&task.0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationTypes;
    use crate::domain::{FieldName, NestingDescriptor, OutcomeKind, OwnerDescriptor, RecordId, TypeName};
    use crate::impls::{Document, InMemoryDocumentStore, StoreOp};
    use crate::testing::{AssetCall, ScriptedAssets};
    use serde_json::json;

    async fn handler(
        regenerate: bool,
    ) -> (
        InMemoryDocumentStore,
        Arc<ScriptedAssets>,
        ProcessAssetHandler<InMemoryDocumentStore, ScriptedAssets>,
    ) {
        let store = InMemoryDocumentStore::new();
        store
            .insert(
                "User",
                Document::new("22")
                    .with_attribute("image", json!("avatar.jpg"))
                    .with_attribute("image_processing", json!(true))
                    .with_many(
                        "photos",
                        vec![
                            Document::new("1")
                                .with_attribute("image", json!("one.jpg"))
                                .with_attribute("image_processing", json!(true)),
                        ],
                    )
                    .with_one(
                        "profile",
                        Document::new("p1").with_attribute("image", json!("me.jpg")),
                    ),
            )
            .await;

        let assets = Arc::new(ScriptedAssets::new("..", "fixtures", regenerate));
        let locator = RecordLocator::new(
            Arc::new(store.clone()),
            Arc::new(RelationTypes::new().with("user", "User")),
        );
        let handler = ProcessAssetHandler::new(locator, Arc::clone(&assets));
        (store, assets, handler)
    }

    fn updates(ops: &[StoreOp]) -> Vec<StoreOp> {
        ops.iter()
            .filter(|op| !matches!(op, StoreOp::Load { .. }))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn processes_versions_and_clears_marker_on_root() {
        let (store, assets, handler) = handler(true).await;

        let outcome = handler
            .perform(&JobDescriptor::root("User", "22", "image"))
            .await
            .unwrap();

        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(
            assets.calls(),
            vec![AssetCall::Recreate {
                record_id: RecordId::new("22"),
                field: FieldName::new("image"),
                mode: SaveMode::Inline,
            }]
        );
        assert_eq!(
            updates(&store.ops().await),
            vec![StoreOp::UpdateAttribute {
                record_id: RecordId::new("22"),
                name: "image_processing".to_string(),
                value: Value::Null,
            }]
        );
        let stored = store
            .get(&TypeName::new("User"), &RecordId::new("22"))
            .await
            .unwrap();
        assert_eq!(stored.attributes["image_processing"], Value::Null);
    }

    #[tokio::test]
    async fn processes_embedded_collection_member() {
        let (store, assets, handler) = handler(true).await;
        let descriptor = JobDescriptor::nested(
            OwnerDescriptor::new("Photo", "1"),
            "1",
            "image",
            NestingDescriptor::many("user", "22", "photos"),
        );

        handler.perform(&descriptor).await.unwrap();

        assert!(matches!(
            &assets.calls()[..],
            [AssetCall::Recreate { record_id, .. }] if record_id.as_str() == "1"
        ));
        let stored = store
            .get(&TypeName::new("User"), &RecordId::new("22"))
            .await
            .unwrap();
        let photo = &stored.embeds_many[&FieldName::new("photos")][0];
        assert_eq!(photo.attributes["image_processing"], Value::Null);
        // 親側のマーカーは触らない
        assert_eq!(stored.attributes["image_processing"], json!(true));
    }

    #[tokio::test]
    async fn record_without_marker_gets_no_update() {
        let (store, _assets, handler) = handler(true).await;
        let descriptor = JobDescriptor::nested(
            OwnerDescriptor::new("Profile", "p1"),
            "1",
            "image",
            NestingDescriptor::one("user", "22", "profile"),
        );

        let outcome = handler.perform(&descriptor).await.unwrap();

        assert!(outcome.artifacts.is_empty());
        assert!(updates(&store.ops().await).is_empty());
    }

    #[tokio::test]
    async fn failed_regeneration_leaves_marker() {
        let (store, _assets, handler) = handler(false).await;

        let err = handler
            .perform(&JobDescriptor::root("User", "22", "image"))
            .await
            .unwrap_err();

        assert!(matches!(err, AssetJobError::RegenerationFailed { .. }));
        assert!(updates(&store.ops().await).is_empty());
        let stored = store
            .get(&TypeName::new("User"), &RecordId::new("22"))
            .await
            .unwrap();
        assert_eq!(stored.attributes["image_processing"], json!(true));
    }

    #[tokio::test]
    async fn missing_record_is_reported_before_any_asset_work() {
        let (_store, assets, handler) = handler(true).await;

        let err = handler
            .perform(&JobDescriptor::root("User", "404", "image"))
            .await
            .unwrap_err();

        assert!(matches!(err, AssetJobError::NotFound(_)));
        assert!(assets.calls().is_empty());
    }
}
