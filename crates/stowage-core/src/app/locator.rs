//! RecordLocator - descriptor から操作対象のレコードを解決する
//!
//! # 解決手順
//! 1. nesting 無し: `load(owner_type, owner_id)`
//! 2. nesting 有り: relation 名から親の型を引き、`load(parent_type, parent_id)`
//!    - collection_field: 親の collection から `target_id` の子を探す
//!    - singular_field: 親の singular embed をそのまま返す（`target_id` は見ない）
//!    - どちらも無い: 1. にフォールバック
//!
//! 読み取りのみ。キャッシュもリトライもしない。ストアのエラーはそのまま返す。

use std::sync::Arc;

use tracing::debug;

use crate::config::RelationTypes;
use crate::domain::{AssetJobError, Embedding, JobDescriptor, Lookup, NestingDescriptor};
use crate::ports::{Record, RecordStore};

pub struct RecordLocator<S> {
    store: Arc<S>,
    relations: Arc<RelationTypes>,
}

impl<S> Clone for RecordLocator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            relations: Arc::clone(&self.relations),
        }
    }
}

impl<S: RecordStore> RecordLocator<S> {
    pub fn new(store: Arc<S>, relations: Arc<RelationTypes>) -> Self {
        Self { store, relations }
    }

    pub async fn resolve(&self, descriptor: &JobDescriptor) -> Result<S::Record, AssetJobError> {
        match &descriptor.nesting {
            Some(nesting) if nesting.embedding() != Embedding::Unspecified => {
                self.resolve_embedded(descriptor, nesting).await
            }
            _ => self.resolve_root(descriptor).await,
        }
    }

    async fn resolve_root(&self, descriptor: &JobDescriptor) -> Result<S::Record, AssetJobError> {
        let owner = &descriptor.owner;
        debug!(owner_type = %owner.owner_type, owner_id = %owner.owner_id, "resolving root record");

        self.store
            .load(&owner.owner_type, &owner.owner_id)
            .await?
            .ok_or_else(|| {
                AssetJobError::NotFound(Lookup::Root {
                    type_name: owner.owner_type.clone(),
                    id: owner.owner_id.clone(),
                })
            })
    }

    async fn resolve_embedded(
        &self,
        descriptor: &JobDescriptor,
        nesting: &NestingDescriptor,
    ) -> Result<S::Record, AssetJobError> {
        let parent_type = self
            .relations
            .resolve(&nesting.parent_field)
            .ok_or_else(|| AssetJobError::UnknownRelation(nesting.parent_field.clone()))?;
        debug!(
            parent_type = %parent_type,
            parent_id = %nesting.parent_id,
            target_id = %descriptor.target_id,
            "resolving embedded record"
        );

        let parent = self
            .store
            .load(parent_type, &nesting.parent_id)
            .await?
            .ok_or_else(|| {
                AssetJobError::NotFound(Lookup::Parent {
                    type_name: parent_type.clone(),
                    id: nesting.parent_id.clone(),
                })
            })?;

        match nesting.embedding() {
            Embedding::Many(collection) => parent
                .find_embedded(collection, &descriptor.target_id)
                .ok_or_else(|| {
                    AssetJobError::NotFound(Lookup::Child {
                        collection: collection.clone(),
                        id: descriptor.target_id.clone(),
                    })
                }),
            Embedding::One(field) => parent.embedded_one(field).ok_or_else(|| {
                AssetJobError::NotFound(Lookup::Singular {
                    field: field.clone(),
                })
            }),
            // resolve() が先に root へ振り分けている
            Embedding::Unspecified => Ok(parent),
        }
    }
}
