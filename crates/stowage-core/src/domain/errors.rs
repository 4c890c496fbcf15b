//! Errors - job 実行エラーと運用分類
//!
//! すべての失敗は queue まで返される。リトライするか dead-letter にするかは
//! queue 側の RetryPolicy が決め、ここでは「どういう種類の失敗か」だけを示す。

use thiserror::Error;

use super::ids::{FieldName, RecordId, TypeName};
use crate::ports::{AssetError, CacheError, PersistenceError};

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（リトライで回復しうる）
/// - Permanent: 恒久的なエラー（リトライしても同じ結果）
/// - Infrastructure: 永続化・ファイル・queue の障害
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Which resolution step came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Lookup {
    #[error("{type_name} id={id}")]
    Root { type_name: TypeName, id: RecordId },

    #[error("parent {type_name} id={id}")]
    Parent { type_name: TypeName, id: RecordId },

    #[error("embedded {collection} id={id}")]
    Child { collection: FieldName, id: RecordId },

    #[error("embedded {field}")]
    Singular { field: FieldName },
}

#[derive(Debug, Error)]
pub enum AssetJobError {
    #[error("record not found: {0}")]
    NotFound(Lookup),

    #[error("no record type registered for relation '{0}'")]
    UnknownRelation(FieldName),

    #[error("version regeneration failed for field '{field}'")]
    RegenerationFailed { field: FieldName },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("payload decode: {0}")]
    Decode(String),
}

impl AssetJobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetJobError::NotFound(_)
            | AssetJobError::UnknownRelation(_)
            | AssetJobError::Decode(_) => ErrorKind::Permanent,
            AssetJobError::RegenerationFailed { .. } | AssetJobError::Asset(_) => {
                ErrorKind::Transient
            }
            AssetJobError::Persistence(PersistenceError::Rejected(_)) => ErrorKind::Transient,
            AssetJobError::Cache(CacheError::InvalidName(_)) => ErrorKind::Permanent,
            AssetJobError::Persistence(_) | AssetJobError::Cache(_) => ErrorKind::Infrastructure,
        }
    }
}
