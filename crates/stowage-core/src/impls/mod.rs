//! Impls - ports の開発用実装
//!
//! - `InMemoryDocumentStore`: 埋め込みドキュメントを持つインメモリの RecordStore
//! - `FsCacheStore`: tokio::fs 上のキャッシュ
//! - `LocalUploader`: ローカルディスクに保存する AssetAccessor

pub mod fs_cache;
pub mod local_assets;
pub mod memory_store;

pub use self::fs_cache::FsCacheStore;
pub use self::local_assets::LocalUploader;
pub use self::memory_store::{Document, DocumentRecord, InMemoryDocumentStore, StoreOp};
