//! Queue module: state management, retry logic, and in-memory implementation.
//!
//! The core only needs the `JobQueue` port; this in-memory queue backs the
//! worker runtime and the CLI demo.

mod memory;
mod record;
mod retry;
mod state;

pub use memory::InMemoryJobQueue;
pub use record::JobRecord;
pub use retry::{MAX_RETRY_DELAY, RetryPolicy};
pub use state::JobState;
