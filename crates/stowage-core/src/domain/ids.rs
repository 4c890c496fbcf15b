//! Domain identifiers (strongly-typed IDs and names).
//!
//! # 二種類の識別子
//! - **RecordId / TypeName / FieldName**: 永続化層から借りてくる文字列。
//!   queue を跨ぐので、ただの文字列として serialize される（`#[serde(transparent)]`）。
//! - **JobId**: queue が払い出す ULID ベースの ID。
//!
//! newtype にしているのは、`owner_id` と `parent_id`、`parent_field` と
//! `asset_field` のような「同じ String だが意味が違う」値を混同させないため。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Identifier of a persisted record (root document or embedded child).
    RecordId
}

string_id! {
    /// Name of a persisted record type (e.g. `User`).
    TypeName
}

string_id! {
    /// Name of a field on a record (asset column, relation, or embed).
    FieldName
}

impl FieldName {
    /// `<field>_tmp`: 未保存アップロードの cache 名を保持する属性
    pub fn tmp_attribute(&self) -> String {
        format!("{}_tmp", self.0)
    }

    /// `<field>_processing`: 処理中マーカー属性
    pub fn processing_attribute(&self) -> String {
        format!("{}_processing", self.0)
    }
}

/// Identifier of an enqueued job.
///
/// ULID なので生成順でソートでき、複数プロセスから調整なしで発行できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Ulid);

impl JobId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for JobId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_derives_conventional_attributes() {
        let field = FieldName::new("image");
        assert_eq!(field.tmp_attribute(), "image_tmp");
        assert_eq!(field.processing_attribute(), "image_processing");
    }

    #[test]
    fn string_ids_serialize_as_plain_strings() {
        let id = RecordId::new("22");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"22\"");

        let back: RecordId = serde_json::from_str("\"22\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn job_id_display_has_prefix() {
        let job_id = JobId::from_ulid(Ulid::new());
        assert!(job_id.to_string().starts_with("job-"));
    }
}
