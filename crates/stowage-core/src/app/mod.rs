//! App - job の実行ロジックとワイヤリング
//!
//! - `locator`: descriptor → レコード
//! - `process_asset` / `store_asset`: 2 種類の job handler
//! - `dispatch`: save lifecycle から job を積む側
//! - `builder` / `worker`: handler の登録と実行ループ

pub mod builder;
pub mod dispatch;
pub mod locator;
pub mod process_asset;
pub mod store_asset;
pub mod worker;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatch::{BackgroundAsset, BackgroundOptions};
pub use self::locator::RecordLocator;
pub use self::process_asset::ProcessAssetHandler;
pub use self::store_asset::StoreAssetHandler;
pub use self::worker::WorkerGroup;
