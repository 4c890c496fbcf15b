//! stowage-core
//!
//! Deferred asset jobs for records that may live embedded inside other records.
//!
//! # モジュール構成
//! - **domain**: ids, JobDescriptor, SaveMode, Outcome, errors
//! - **ports**: RecordStore / AssetAccessor / CacheStore / JobQueue などの境界
//! - **app**: RecordLocator, process/store handler, enqueue 側の BackgroundAsset, worker
//! - **typed**: 型付き Task API（Task trait, Handler trait, TypedRegistry）
//! - **queue**: retry/dead-letter 付きのインメモリ JobQueue
//! - **impls**: 開発用の ports 実装
//! - **config**: JSON 設定（relation registry, retry policy, uploader layout）
//! - **observability**: queue の集計と tracing 初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod typed;

#[cfg(test)]
mod testing;
