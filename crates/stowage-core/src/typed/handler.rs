//! Handler trait - Task を実行する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (Handler<T>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<T, H> → DynHandler)

use std::marker::PhantomData;

use async_trait::async_trait;

use super::task::Task;
use crate::domain::{AssetJobError, JobKind, Outcome};

/// Handler は Task を実行して Outcome を返す
///
/// # ジェネリクスによる型安全性
/// - `Handler<StoreAsset>` は `StoreAsset` しか受け取れない
/// - コンパイル時に Task と Handler の対応が保証される
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<Outcome, AssetJobError>;
}

/// DynHandler は object-safe な Handler の抽象化
///
/// TypedHandler<T> を DynHandler に変換することで、
/// HashMap<JobKind, Arc<dyn DynHandler>> に格納可能にする。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<Outcome, AssetJobError>;
    fn kind(&self) -> JobKind;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<Outcome, AssetJobError> {
        let task: T = serde_json::from_value(payload)
            .map_err(|e| AssetJobError::Decode(format!("{} payload: {e}", T::KIND)))?;
        self.handler.handle(task).await
    }

    fn kind(&self) -> JobKind {
        T::KIND
    }
}
