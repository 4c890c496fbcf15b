//! AppBuilder - handler の登録と起動時検証
//!
//! `expect_kinds()` で期待する JobKind を宣言しておくと、`build()` 時に
//! 未登録のものがあれば BuildError を返す（Fail-fast）。

use std::sync::Arc;

use crate::domain::JobKind;
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .register::<ProcessAsset, _>(process_handler)?
///     .register::<StoreAsset, _>(store_handler)?
///     .expect_kinds(&[JobKind::Process, JobKind::Store])
///     .build()?;
/// ```
pub struct AppBuilder {
    registry: TypedRegistry,
    expected_kinds: Option<Vec<JobKind>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing handlers for job kinds: {0:?}")]
    MissingKinds(Vec<JobKind>),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: TypedRegistry::new(),
            expected_kinds: None,
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    pub fn expect_kinds(mut self, kinds: &[JobKind]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    /// 期待集合 ⊆ 登録済み集合 をチェックして App を作る
    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected_kinds {
            let registered = self.registry.registered_kinds();
            let missing: Vec<JobKind> = expected
                .iter()
                .filter(|kind| !registered.contains(kind))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingKinds(missing));
            }
        }
        Ok(App {
            registry: Arc::new(self.registry),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated handler set, shared with the worker group.
pub struct App {
    pub registry: Arc<TypedRegistry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetJobError, Outcome};
    use crate::typed::{ProcessAsset, StoreAsset};
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl Handler<ProcessAsset> for NoopHandler {
        async fn handle(&self, _task: ProcessAsset) -> Result<Outcome, AssetJobError> {
            Ok(Outcome::success())
        }
    }

    #[test]
    fn test_build_success() {
        let app = AppBuilder::new()
            .register::<ProcessAsset, _>(NoopHandler)
            .unwrap()
            .expect_kinds(&[JobKind::Process])
            .build();
        assert!(app.is_ok());
    }

    #[test]
    fn test_build_missing_kinds() {
        let app = AppBuilder::new()
            .register::<ProcessAsset, _>(NoopHandler)
            .unwrap()
            .expect_kinds(&[JobKind::Process, StoreAsset::KIND])
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingKinds(missing)) if missing == vec![JobKind::Store]
        ));
    }

    #[test]
    fn test_build_no_expect_kinds() {
        let app = AppBuilder::new()
            .register::<ProcessAsset, _>(NoopHandler)
            .unwrap()
            .build();
        assert!(app.is_ok());
    }
}
