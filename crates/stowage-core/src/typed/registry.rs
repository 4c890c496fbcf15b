//! TypedRegistry - Handler の登録と管理
//!
//! # 内部実装
//! - `register::<T: Task>(handler: impl Handler<T>)` で登録
//! - 内部的に TypedHandler でラップして DynHandler に変換
//! - HashMap<JobKind, Arc<dyn DynHandler>> で管理

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{DynHandler, Handler, TypedHandler};
use super::task::Task;
use crate::domain::JobKind;

#[derive(Default)]
pub struct TypedRegistry {
    handlers: HashMap<JobKind, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for job kind '{0}' is already registered")]
    AlreadyRegistered(JobKind),
}

impl TypedRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&T::KIND) {
            return Err(RegistryError::AlreadyRegistered(T::KIND));
        }
        self.handlers
            .insert(T::KIND, Arc::new(TypedHandler::new(handler)));
        Ok(())
    }

    pub fn get(&self, kind: JobKind) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn registered_kinds(&self) -> Vec<JobKind> {
        self.handlers.keys().copied().collect()
    }
}
