//! Job record: metadata + envelope.

use std::time::Instant;

use super::JobState;
use crate::domain::{ErrorKind, JobEnvelope};

/// Metadata + envelope for a job in the queue.
///
/// Queue structures (ready/scheduled) hold JobId only; all state
/// transitions happen here.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub envelope: JobEnvelope,
    pub state: JobState,

    /// Number of times this job has been leased (including the current one if Running).
    pub attempts: u32,

    pub last_error: Option<String>,
    pub last_error_kind: Option<ErrorKind>,

    /// When to retry next (for RetryScheduled state).
    pub next_run_at: Option<Instant>,

    pub created_at: Instant,
    pub updated_at: Instant,
}

impl JobRecord {
    pub fn new(envelope: JobEnvelope) -> Self {
        let now = Instant::now();
        Self {
            envelope,
            state: JobState::Queued,
            attempts: 0,
            last_error: None,
            last_error_kind: None,
            next_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as running (increment attempts).
    pub fn start_attempt(&mut self) {
        self.state = JobState::Running;
        self.attempts += 1;
        self.updated_at = Instant::now();
    }

    pub fn mark_succeeded(&mut self) {
        self.state = JobState::Succeeded;
        self.updated_at = Instant::now();
    }

    /// Mark as dead (max attempts exceeded).
    pub fn mark_dead(&mut self, kind: ErrorKind, error: String) {
        self.state = JobState::Dead;
        self.last_error = Some(error);
        self.last_error_kind = Some(kind);
        self.updated_at = Instant::now();
    }

    /// Schedule retry with backoff.
    pub fn schedule_retry(&mut self, next_run_at: Instant, kind: ErrorKind, error: String) {
        self.state = JobState::RetryScheduled;
        self.next_run_at = Some(next_run_at);
        self.last_error = Some(error);
        self.last_error_kind = Some(kind);
        self.updated_at = Instant::now();
    }

    /// Move from RetryScheduled back to Queued.
    pub fn requeue(&mut self) {
        self.state = JobState::Queued;
        self.next_run_at = None;
        self.updated_at = Instant::now();
    }
}
