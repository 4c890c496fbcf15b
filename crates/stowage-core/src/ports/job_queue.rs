//! JobQueue port - descriptor の配送先
//!
//! queue は at-least-once で job を実行させ、retry/backoff と dead-letter を持つ。
//! core は enqueue する側と、lease を受け取って結果を返す側のみを知っている。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ErrorKind, JobDescriptor, JobEnvelope, JobId, JobKind};
use crate::observability::QueueCounts;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("payload encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// A leased job. The worker owns it and must either `ack` or `fail`.
#[async_trait]
pub trait JobLease: Send {
    fn envelope(&self) -> &JobEnvelope;

    /// Attempt number of this lease (1-indexed).
    fn attempt(&self) -> u32;

    async fn ack(self: Box<Self>) -> Result<(), QueueError>;

    /// Report failure; the queue decides between retry and dead-letter.
    async fn fail(self: Box<Self>, kind: ErrorKind, error: String) -> Result<(), QueueError>;
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, kind: JobKind, descriptor: &JobDescriptor)
    -> Result<JobId, QueueError>;

    /// Lease one ready job (waits until one is available).
    async fn lease(&self) -> Option<Box<dyn JobLease>>;

    async fn counts_by_state(&self) -> Result<QueueCounts, QueueError>;
}
