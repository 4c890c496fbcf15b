//! RecordStore port - 永続化層（ORM）の抽象化
//!
//! core が必要とするのは次の操作だけ:
//! - `load(type, id)`: ルートレコードの取得
//! - 埋め込みレコードの取得（collection から id 指定 / singular embed の直接参照）
//! - 属性の読み書き、単一属性の更新、フル save
//!
//! 埋め込みレコードの save が親ドキュメント経由で書かれるかどうかは実装側の責務。

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{FieldName, RecordId, SaveMode, TypeName};

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// save/update returned false (validation, optimistic lock, ...).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The record disappeared between load and write.
    #[error("record vanished before write: {0}")]
    Missing(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A loaded record instance.
///
/// インスタンスはそれぞれの job invocation が自分で load するもので、
/// 複数の job 間で共有されない。
#[async_trait]
pub trait Record: Send + Sync + Sized {
    fn id(&self) -> &RecordId;

    /// Child of an embeds-many collection, looked up by id.
    fn find_embedded(&self, collection: &FieldName, id: &RecordId) -> Option<Self>;

    /// The single child of an embeds-one relation.
    fn embedded_one(&self, field: &FieldName) -> Option<Self>;

    /// Whether the record's schema declares this attribute.
    fn has_attribute(&self, name: &str) -> bool;

    fn attribute(&self, name: &str) -> Option<&Value>;

    /// In-memory assignment; persisted by the next `save`.
    fn set_attribute(&mut self, name: &str, value: Value);

    /// Persist a single attribute without running the full save path.
    async fn update_attribute(&mut self, name: &str, value: Value)
    -> Result<(), PersistenceError>;

    /// Full save (validation included).
    async fn save(&mut self, mode: SaveMode) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    type Record: Record;

    async fn load(
        &self,
        type_name: &TypeName,
        id: &RecordId,
    ) -> Result<Option<Self::Record>, PersistenceError>;
}
