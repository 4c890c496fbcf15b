//! Task trait - 型付き job の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const KIND`)
//! - `#[serde(transparent)]` で payload は JobDescriptor そのものの JSON になる

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{JobDescriptor, JobKind};

/// Task は JobKind と payload の型を対応付ける
///
/// # Trait Bounds
/// - `Serialize` / `DeserializeOwned`: queue を跨いで復元するため
/// - `Send + Sync + 'static`: Arc<dyn DynHandler> に格納するため
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: JobKind;

    fn descriptor(&self) -> &JobDescriptor;
}

/// Regenerate derived versions of an already-stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessAsset(pub JobDescriptor);

impl Task for ProcessAsset {
    const KIND: JobKind = JobKind::Process;

    fn descriptor(&self) -> &JobDescriptor {
        &self.0
    }
}

/// Promote a cached upload into permanent storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreAsset(pub JobDescriptor);

impl Task for StoreAsset {
    const KIND: JobKind = JobKind::Store;

    fn descriptor(&self) -> &JobDescriptor {
        &self.0
    }
}
