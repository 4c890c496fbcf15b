//! JobDescriptor - job が対象レコードを再発見するための情報
//!
//! descriptor は enqueue 時に一度だけ組み立てられ、queue を経由して
//! 別プロセス・別時刻の worker に渡る。そのため中身は文字列のみで、
//! JSON にそのまま落とせる形にしてある。

use serde::{Deserialize, Serialize};

use super::ids::{FieldName, RecordId, TypeName};

/// Aggregate root type and id that resolution starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDescriptor {
    pub owner_type: TypeName,
    pub owner_id: RecordId,
}

impl OwnerDescriptor {
    pub fn new(owner_type: impl Into<TypeName>, owner_id: impl Into<RecordId>) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.into(),
        }
    }
}

/// Where an embedded target lives inside its parent.
///
/// `collection_field` と `singular_field` はどちらか一方だけが設定される想定。
/// 両方とも無い場合は owner 自身が対象になる（[`Embedding::Unspecified`]）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestingDescriptor {
    /// Relation on the embedded record pointing at its parent (e.g. `user`).
    pub parent_field: FieldName,
    pub parent_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_field: Option<FieldName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_field: Option<FieldName>,
}

/// The embedding shape a [`NestingDescriptor`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embedding<'a> {
    /// One of many children; pick by `target_id`.
    Many(&'a FieldName),
    /// Exactly one child; no id to compare.
    One(&'a FieldName),
    /// Neither field set: the owner itself is the target.
    Unspecified,
}

impl NestingDescriptor {
    pub fn many(
        parent_field: impl Into<FieldName>,
        parent_id: impl Into<RecordId>,
        collection_field: impl Into<FieldName>,
    ) -> Self {
        Self {
            parent_field: parent_field.into(),
            parent_id: parent_id.into(),
            collection_field: Some(collection_field.into()),
            singular_field: None,
        }
    }

    pub fn one(
        parent_field: impl Into<FieldName>,
        parent_id: impl Into<RecordId>,
        singular_field: impl Into<FieldName>,
    ) -> Self {
        Self {
            parent_field: parent_field.into(),
            parent_id: parent_id.into(),
            collection_field: None,
            singular_field: Some(singular_field.into()),
        }
    }

    /// Classify the nesting. A collection field wins over a singular one.
    pub fn embedding(&self) -> Embedding<'_> {
        match (&self.collection_field, &self.singular_field) {
            (Some(collection), _) => Embedding::Many(collection),
            (None, Some(singular)) => Embedding::One(singular),
            (None, None) => Embedding::Unspecified,
        }
    }
}

/// Everything a worker needs to redo the resolution and act on one asset field.
///
/// `target_id` はミューテーション対象のレコード ID。nesting がある場合は
/// 埋め込みレコード側の ID で、collection lookup のときだけ参照される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub owner: OwnerDescriptor,
    pub target_id: RecordId,
    pub asset_field: FieldName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nesting: Option<NestingDescriptor>,
}

impl JobDescriptor {
    /// Descriptor for a top-level record: the owner is the target.
    pub fn root(
        owner_type: impl Into<TypeName>,
        owner_id: impl Into<RecordId>,
        asset_field: impl Into<FieldName>,
    ) -> Self {
        let owner = OwnerDescriptor::new(owner_type, owner_id);
        Self {
            target_id: owner.owner_id.clone(),
            owner,
            asset_field: asset_field.into(),
            nesting: None,
        }
    }

    /// Descriptor for an embedded record.
    pub fn nested(
        owner: OwnerDescriptor,
        target_id: impl Into<RecordId>,
        asset_field: impl Into<FieldName>,
        nesting: NestingDescriptor,
    ) -> Self {
        Self {
            owner,
            target_id: target_id.into(),
            asset_field: asset_field.into(),
            nesting: Some(nesting),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_descriptor_targets_owner() {
        let d = JobDescriptor::root("User", "22", "image");
        assert_eq!(d.target_id, RecordId::new("22"));
        assert_eq!(d.owner.owner_type, TypeName::new("User"));
        assert!(d.nesting.is_none());
    }

    #[test]
    fn descriptor_serializes_to_plain_scalars() {
        let d = JobDescriptor::nested(
            OwnerDescriptor::new("Photo", "1"),
            "1",
            "image",
            NestingDescriptor::many("user", "22", "photos"),
        );
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(
            v,
            json!({
                "owner": { "owner_type": "Photo", "owner_id": "1" },
                "target_id": "1",
                "asset_field": "image",
                "nesting": {
                    "parent_field": "user",
                    "parent_id": "22",
                    "collection_field": "photos"
                }
            })
        );

        let back: JobDescriptor = serde_json::from_value(v).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn embedding_shapes() {
        let many = NestingDescriptor::many("user", "22", "photos");
        assert_eq!(many.embedding(), Embedding::Many(&FieldName::new("photos")));

        let one = NestingDescriptor::one("user", "22", "profile");
        assert_eq!(one.embedding(), Embedding::One(&FieldName::new("profile")));

        let neither: NestingDescriptor =
            serde_json::from_value(json!({ "parent_field": "user", "parent_id": "22" })).unwrap();
        assert_eq!(neither.embedding(), Embedding::Unspecified);
    }

    #[test]
    fn collection_wins_when_both_fields_are_set() {
        let mut both = NestingDescriptor::many("user", "22", "photos");
        both.singular_field = Some(FieldName::new("profile"));
        assert_eq!(both.embedding(), Embedding::Many(&FieldName::new("photos")));
    }
}
