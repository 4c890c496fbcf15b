//! Ports - 外部コラボレーターとの境界
//!
//! 各 trait は core の外側にあるもの（永続化層、アップロードフィールド、
//! キャッシュ領域、job queue）へのインターフェースで、実装の詳細を隠蔽する。
//! core はこれらの契約だけに依存し、開発用の実装は `impls` にある。

pub mod asset;
pub mod cache_store;
pub mod clock;
pub mod id_generator;
pub mod job_queue;
pub mod record_store;

pub use self::asset::{AssetAccessor, AssetError};
pub use self::cache_store::{CacheError, CacheStore, CachedFile};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_queue::{JobLease, JobQueue, QueueError};
pub use self::record_store::{PersistenceError, Record, RecordStore};
