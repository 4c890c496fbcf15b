//! Configuration - relation registry, queue policy, uploader layout
//!
//! 設定は JSON ファイルから読み込む。すべての項目にデフォルトがあるので
//! `{}` でも起動できる。
//!
//! ```json
//! {
//!   "relations": { "user": "User" },
//!   "queue": { "max_attempts": 5, "base_delay_ms": 2000, "multiplier": 2.0 },
//!   "workers": 2,
//!   "uploads": { "root": "public", "cache_dir": "uploads/tmp", "store_dir": "uploads", "versions": ["thumb"] }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FieldName, TypeName};
use crate::queue::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Explicit mapping from a parent relation name to the record type it points at.
///
/// 埋め込みレコードの親の型は、relation 名から文字列変換で推測せず、
/// ここに登録されたものだけを使う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationTypes(HashMap<FieldName, TypeName>);

impl RelationTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: impl Into<FieldName>, type_name: impl Into<TypeName>) -> Self {
        self.0.insert(relation.into(), type_name.into());
        self
    }

    pub fn resolve(&self, relation: &FieldName) -> Option<&TypeName> {
        self.0.get(relation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default_v1();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl QueueConfig {
    /// `multiplier` must be finite and at least 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "queue.multiplier must be a finite number >= 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.multiplier,
            max_attempts: self.max_attempts.max(1),
        }
    }
}

/// Directory layout of the local uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub root: PathBuf,
    /// Relative to `root`.
    pub cache_dir: PathBuf,
    /// Relative to `root`.
    pub store_dir: PathBuf,
    /// Names of derived versions recreated by process jobs.
    pub versions: Vec<String>,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            cache_dir: PathBuf::from("uploads/tmp"),
            store_dir: PathBuf::from("uploads"),
            versions: vec!["thumb".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    pub relations: RelationTypes,
    pub queue: QueueConfig,
    pub workers: usize,
    pub uploads: UploadsConfig,
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            relations: RelationTypes::default(),
            queue: QueueConfig::default(),
            workers: 2,
            uploads: UploadsConfig::default(),
        }
    }
}

impl StowageConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.queue.validate()?;
        Ok(config)
    }

    /// Number of workers to spawn; never zero.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let config: StowageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StowageConfig::default());
        assert_eq!(config.queue.retry_policy().max_attempts, 5);
    }

    #[test]
    fn relations_resolve_registered_names_only() {
        let config: StowageConfig =
            serde_json::from_str(r#"{ "relations": { "user": "User" } }"#).unwrap();
        assert_eq!(
            config.relations.resolve(&FieldName::new("user")),
            Some(&TypeName::new("User"))
        );
        assert_eq!(config.relations.resolve(&FieldName::new("account")), None);
    }

    #[test]
    fn from_path_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "workers": 4, "queue": {{ "max_attempts": 3, "base_delay_ms": 10 }} }}"#
        )
        .unwrap();

        let config = StowageConfig::from_path(file.path()).unwrap();
        assert_eq!(config.workers, 4);

        let policy = config.queue.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[rstest]
    #[case::negative(r#"{ "queue": { "multiplier": -2.0 } }"#)]
    #[case::shrinking(r#"{ "queue": { "multiplier": 0.5 } }"#)]
    fn from_path_rejects_bad_multiplier(#[case] raw: &str) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{raw}").unwrap();

        let err = StowageConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("queue.multiplier")));
    }

    #[test]
    fn unvalidated_bad_multiplier_does_not_panic_on_delay() {
        let config: StowageConfig =
            serde_json::from_str(r#"{ "queue": { "multiplier": -2.0 } }"#).unwrap();
        assert!(config.queue.validate().is_err());
        assert_eq!(config.queue.retry_policy().next_delay(2), crate::queue::MAX_RETRY_DELAY);
    }

    #[test]
    fn zero_workers_is_clamped_to_one() {
        let config: StowageConfig = serde_json::from_str(r#"{ "workers": 0 }"#).unwrap();
        assert_eq!(config.worker_count(), 1);
        assert_eq!(StowageConfig::default().worker_count(), 2);
    }

    #[test]
    fn from_path_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = StowageConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
