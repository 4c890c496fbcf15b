//! InMemoryDocumentStore - 開発・テスト用のドキュメントストア
//!
//! # 実装詳細
//! - ルートドキュメントを `TypeName -> RecordId -> Document` で保持
//! - 埋め込みドキュメントは親の中にそのまま入っている（embeds_many / embeds_one）
//! - load したレコードはスナップショット。save はルートからの path を辿って書き戻す
//! - すべての load/save/update を `StoreOp` として記録する（テストでの検証用）
//!
//! 同一レコードへの同時書き込みは last-write-wins。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{FieldName, RecordId, SaveMode, TypeName};
use crate::ports::{PersistenceError, Record, RecordStore};

/// A stored document with its embedded children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    #[serde(default)]
    pub embeds_many: BTreeMap<FieldName, Vec<Document>>,

    #[serde(default)]
    pub embeds_one: BTreeMap<FieldName, Document>,
}

impl Document {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
            embeds_many: BTreeMap::new(),
            embeds_one: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_many(mut self, field: impl Into<FieldName>, children: Vec<Document>) -> Self {
        self.embeds_many.insert(field.into(), children);
        self
    }

    pub fn with_one(mut self, field: impl Into<FieldName>, child: Document) -> Self {
        self.embeds_one.insert(field.into(), child);
        self
    }

    fn child_mut(&mut self, step: &EmbedStep) -> Option<&mut Document> {
        match step {
            EmbedStep::Many { field, id } => self
                .embeds_many
                .get_mut(field)?
                .iter_mut()
                .find(|child| &child.id == id),
            EmbedStep::One { field } => self.embeds_one.get_mut(field),
        }
    }

    fn at_path_mut(&mut self, path: &[EmbedStep]) -> Option<&mut Document> {
        let mut doc = self;
        for step in path {
            doc = doc.child_mut(step)?;
        }
        Some(doc)
    }
}

/// One hop from a parent document to an embedded child.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EmbedStep {
    Many { field: FieldName, id: RecordId },
    One { field: FieldName },
}

/// Operations observed by the store, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Load {
        type_name: TypeName,
        id: RecordId,
    },
    Save {
        record_id: RecordId,
        mode: SaveMode,
        accepted: bool,
    },
    UpdateAttribute {
        record_id: RecordId,
        name: String,
        value: Value,
    },
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<TypeName, BTreeMap<RecordId, Document>>,
    ops: Vec<StoreOp>,
    reject_saves: bool,
}

impl StoreState {
    fn document_mut(
        &mut self,
        root_type: &TypeName,
        root_id: &RecordId,
        path: &[EmbedStep],
    ) -> Option<&mut Document> {
        self.collections
            .get_mut(root_type)?
            .get_mut(root_id)?
            .at_path_mut(path)
    }
}

/// In-memory document store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, type_name: impl Into<TypeName>, document: Document) {
        let mut state = self.state.lock().await;
        state
            .collections
            .entry(type_name.into())
            .or_default()
            .insert(document.id.clone(), document);
    }

    /// Snapshot of a root document.
    pub async fn get(&self, type_name: &TypeName, id: &RecordId) -> Option<Document> {
        let state = self.state.lock().await;
        state.collections.get(type_name)?.get(id).cloned()
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.state.lock().await.ops.clone()
    }

    /// Number of save calls, accepted or not.
    pub async fn save_count(&self) -> usize {
        let state = self.state.lock().await;
        state
            .ops
            .iter()
            .filter(|op| matches!(op, StoreOp::Save { .. }))
            .count()
    }

    /// Make every subsequent `save` fail validation.
    pub async fn reject_saves(&self, reject: bool) {
        self.state.lock().await.reject_saves = reject;
    }
}

#[async_trait]
impl RecordStore for InMemoryDocumentStore {
    type Record = DocumentRecord;

    async fn load(
        &self,
        type_name: &TypeName,
        id: &RecordId,
    ) -> Result<Option<DocumentRecord>, PersistenceError> {
        let mut state = self.state.lock().await;
        state.ops.push(StoreOp::Load {
            type_name: type_name.clone(),
            id: id.clone(),
        });
        let doc = state
            .collections
            .get(type_name)
            .and_then(|collection| collection.get(id))
            .cloned();

        Ok(doc.map(|doc| DocumentRecord {
            state: Arc::clone(&self.state),
            root_type: type_name.clone(),
            root_id: id.clone(),
            path: Vec::new(),
            doc,
        }))
    }
}

/// A loaded document (root or embedded) plus the path back to its root.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    state: Arc<Mutex<StoreState>>,
    root_type: TypeName,
    root_id: RecordId,
    path: Vec<EmbedStep>,
    doc: Document,
}

impl DocumentRecord {
    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn child(&self, step: EmbedStep, doc: Document) -> Self {
        let mut path = self.path.clone();
        path.push(step);
        Self {
            state: Arc::clone(&self.state),
            root_type: self.root_type.clone(),
            root_id: self.root_id.clone(),
            path,
            doc,
        }
    }

    fn missing(&self) -> PersistenceError {
        PersistenceError::Missing(format!(
            "id={} under {} id={}",
            self.doc.id,
            self.root_type,
            self.root_id
        ))
    }
}

#[async_trait]
impl Record for DocumentRecord {
    fn id(&self) -> &RecordId {
        &self.doc.id
    }

    fn find_embedded(&self, collection: &FieldName, id: &RecordId) -> Option<Self> {
        let child = self
            .doc
            .embeds_many
            .get(collection)?
            .iter()
            .find(|child| &child.id == id)?;
        let step = EmbedStep::Many {
            field: collection.clone(),
            id: id.clone(),
        };
        Some(self.child(step, child.clone()))
    }

    fn embedded_one(&self, field: &FieldName) -> Option<Self> {
        let child = self.doc.embeds_one.get(field)?;
        let step = EmbedStep::One {
            field: field.clone(),
        };
        Some(self.child(step, child.clone()))
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.doc.attributes.contains_key(name)
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.doc.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.doc.attributes.insert(name.to_string(), value);
    }

    async fn update_attribute(
        &mut self,
        name: &str,
        value: Value,
    ) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().await;
        state.ops.push(StoreOp::UpdateAttribute {
            record_id: self.doc.id.clone(),
            name: name.to_string(),
            value: value.clone(),
        });
        let Some(stored) = state.document_mut(&self.root_type, &self.root_id, &self.path) else {
            return Err(self.missing());
        };
        stored.attributes.insert(name.to_string(), value.clone());
        self.doc.attributes.insert(name.to_string(), value);
        Ok(())
    }

    async fn save(&mut self, mode: SaveMode) -> Result<(), PersistenceError> {
        let mut state = self.state.lock().await;
        let accepted = !state.reject_saves;
        state.ops.push(StoreOp::Save {
            record_id: self.doc.id.clone(),
            mode,
            accepted,
        });
        if !accepted {
            return Err(PersistenceError::Rejected(format!(
                "validation failed for id={}",
                self.doc.id
            )));
        }
        let Some(stored) = state.document_mut(&self.root_type, &self.root_id, &self.path) else {
            return Err(self.missing());
        };
        *stored = self.doc.clone();
        Ok(())
    }
}
