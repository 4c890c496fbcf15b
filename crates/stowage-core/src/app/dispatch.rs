//! BackgroundAsset - enqueue 側の契約
//!
//! アセットフィールドごとに「どの job kind で、どの埋め込み形で」バックグラウンド化
//! するかを宣言し、save lifecycle の前後で呼ばれるフックを提供する。
//!
//! - `before_save`: process 対象なら `<field>_processing = true` を立てる
//! - `after_save`: `JobDescriptor` を組み立てて queue に積む
//!
//! どちらも `SaveMode::Inline` では何もしない。job 自身が行う save が
//! もう一度 job を積んでしまうのを防ぐのはこの分岐だけ。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::{
    FieldName, JobDescriptor, JobId, JobKind, NestingDescriptor, OwnerDescriptor, RecordId,
    SaveMode, TypeName,
};
use crate::ports::{JobQueue, QueueError, Record};

/// How the owning record is embedded, declared alongside the asset field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// Relation pointing at the parent (e.g. `user`).
    pub embedded_in: Option<FieldName>,
    /// Parent's embeds-many collection holding this record (e.g. `photos`).
    pub inverse_of: Option<FieldName>,
    /// Parent's embeds-one field holding this record (e.g. `profile`).
    pub embeds_one: Option<FieldName>,
}

impl BackgroundOptions {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn embedded_many(embedded_in: impl Into<FieldName>, inverse_of: impl Into<FieldName>) -> Self {
        Self {
            embedded_in: Some(embedded_in.into()),
            inverse_of: Some(inverse_of.into()),
            embeds_one: None,
        }
    }

    pub fn embedded_one(embedded_in: impl Into<FieldName>, embeds_one: impl Into<FieldName>) -> Self {
        Self {
            embedded_in: Some(embedded_in.into()),
            inverse_of: None,
            embeds_one: Some(embeds_one.into()),
        }
    }
}

/// A background declaration for one asset field of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundAsset {
    kind: JobKind,
    owner_type: TypeName,
    field: FieldName,
    options: BackgroundOptions,
}

impl BackgroundAsset {
    /// Versions are processed by a background job after save.
    pub fn process_in_background(
        owner_type: impl Into<TypeName>,
        field: impl Into<FieldName>,
        options: BackgroundOptions,
    ) -> Self {
        Self {
            kind: JobKind::Process,
            owner_type: owner_type.into(),
            field: field.into(),
            options,
        }
    }

    /// The upload stays in the cache until a background job stores it.
    pub fn store_in_background(
        owner_type: impl Into<TypeName>,
        field: impl Into<FieldName>,
        options: BackgroundOptions,
    ) -> Self {
        Self {
            kind: JobKind::Store,
            owner_type: owner_type.into(),
            field: field.into(),
            options,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn field(&self) -> &FieldName {
        &self.field
    }

    /// Build the immutable descriptor for a saved record.
    ///
    /// `parent_id` is only used when the field was declared `embedded_in`.
    pub fn descriptor_for(&self, record_id: &RecordId, parent_id: Option<&RecordId>) -> JobDescriptor {
        let owner = OwnerDescriptor {
            owner_type: self.owner_type.clone(),
            owner_id: record_id.clone(),
        };
        match (&self.options.embedded_in, parent_id) {
            (Some(parent_field), Some(parent_id)) => JobDescriptor::nested(
                owner,
                record_id.clone(),
                self.field.clone(),
                NestingDescriptor {
                    parent_field: parent_field.clone(),
                    parent_id: parent_id.clone(),
                    collection_field: self.options.inverse_of.clone(),
                    singular_field: self.options.embeds_one.clone(),
                },
            ),
            _ => JobDescriptor {
                target_id: record_id.clone(),
                owner,
                asset_field: self.field.clone(),
                nesting: None,
            },
        }
    }

    pub fn before_save<R: Record>(&self, record: &mut R, mode: SaveMode) {
        if self.kind != JobKind::Process || mode.skips_background_dispatch() {
            return;
        }
        let marker = self.field.processing_attribute();
        if record.has_attribute(&marker) {
            record.set_attribute(&marker, Value::Bool(true));
        }
    }

    pub async fn after_save<Q: JobQueue + ?Sized>(
        &self,
        queue: &Q,
        record_id: &RecordId,
        parent_id: Option<&RecordId>,
        mode: SaveMode,
    ) -> Result<Option<JobId>, QueueError> {
        if mode.skips_background_dispatch() {
            debug!(kind = %self.kind, record_id = %record_id, field = %self.field, "inline save, not enqueueing");
            return Ok(None);
        }

        let descriptor = self.descriptor_for(record_id, parent_id);
        let job_id = queue.enqueue(self.kind, &descriptor).await?;
        info!(%job_id, kind = %self.kind, record_id = %record_id, field = %self.field, "enqueued background job");
        Ok(Some(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{Document, InMemoryDocumentStore};
    use crate::ports::RecordStore;
    use crate::queue::{InMemoryJobQueue, RetryPolicy};
    use serde_json::json;

    #[test]
    fn root_declaration_builds_root_descriptor() {
        let asset = BackgroundAsset::process_in_background("User", "image", BackgroundOptions::root());

        let descriptor = asset.descriptor_for(&RecordId::new("22"), None);

        assert_eq!(descriptor, JobDescriptor::root("User", "22", "image"));
    }

    #[test]
    fn embeds_many_declaration_carries_collection_and_parent_id() {
        let asset = BackgroundAsset::store_in_background(
            "Photo",
            "image",
            BackgroundOptions::embedded_many("user", "photos"),
        );

        let descriptor = asset.descriptor_for(&RecordId::new("1"), Some(&RecordId::new("22")));

        assert_eq!(
            descriptor,
            JobDescriptor::nested(
                OwnerDescriptor::new("Photo", "1"),
                "1",
                "image",
                NestingDescriptor::many("user", "22", "photos"),
            )
        );
    }

    #[test]
    fn embeds_one_declaration_carries_singular_field() {
        let asset = BackgroundAsset::store_in_background(
            "Profile",
            "avatar",
            BackgroundOptions::embedded_one("user", "profile"),
        );

        let descriptor = asset.descriptor_for(&RecordId::new("p1"), Some(&RecordId::new("22")));

        let nesting = descriptor.nesting.unwrap();
        assert_eq!(nesting, NestingDescriptor::one("user", "22", "profile"));
    }

    #[tokio::test]
    async fn before_save_marks_processing_only_for_deferred_saves() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(
                "User",
                Document::new("22").with_attribute("image_processing", Value::Null),
            )
            .await;
        let mut record = store
            .load(&TypeName::new("User"), &RecordId::new("22"))
            .await
            .unwrap()
            .unwrap();
        let asset = BackgroundAsset::process_in_background("User", "image", BackgroundOptions::root());

        asset.before_save(&mut record, SaveMode::Inline);
        assert_eq!(record.attribute("image_processing"), Some(&Value::Null));

        asset.before_save(&mut record, SaveMode::Deferred);
        assert_eq!(record.attribute("image_processing"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn before_save_skips_undeclared_marker() {
        let store = InMemoryDocumentStore::new();
        store.insert("User", Document::new("22")).await;
        let mut record = store
            .load(&TypeName::new("User"), &RecordId::new("22"))
            .await
            .unwrap()
            .unwrap();
        let asset = BackgroundAsset::process_in_background("User", "image", BackgroundOptions::root());

        asset.before_save(&mut record, SaveMode::Deferred);

        assert!(!record.has_attribute("image_processing"));
    }

    #[tokio::test]
    async fn after_save_enqueues_only_for_deferred_saves() {
        let queue = InMemoryJobQueue::new(RetryPolicy::default_v1());
        let asset = BackgroundAsset::store_in_background(
            "Photo",
            "image",
            BackgroundOptions::embedded_many("user", "photos"),
        );
        let record_id = RecordId::new("1");
        let parent_id = RecordId::new("22");

        let skipped = asset
            .after_save(&queue, &record_id, Some(&parent_id), SaveMode::Inline)
            .await
            .unwrap();
        assert!(skipped.is_none());
        assert_eq!(queue.counts_by_state().await.unwrap().queued, 0);

        let job_id = asset
            .after_save(&queue, &record_id, Some(&parent_id), SaveMode::Deferred)
            .await
            .unwrap()
            .unwrap();

        let lease = queue.lease().await.unwrap();
        assert_eq!(lease.envelope().job_id(), job_id);
        assert_eq!(lease.envelope().kind(), JobKind::Store);
        let descriptor: JobDescriptor =
            serde_json::from_value(lease.envelope().payload().clone()).unwrap();
        assert_eq!(descriptor, asset.descriptor_for(&record_id, Some(&parent_id)));
    }
}
