//! Observability - queue の状態集計と tracing の初期化

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Job counts per queue state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub retry_scheduled: usize,
    pub dead: usize,
}

impl QueueCounts {
    /// Nothing queued, running or waiting for a retry.
    pub fn is_drained(&self) -> bool {
        self.queued == 0 && self.running == 0 && self.retry_scheduled == 0
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. Calling this twice is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
