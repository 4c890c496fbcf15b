//! In-memory job queue implementation.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use super::{JobRecord, JobState, RetryPolicy};
use crate::domain::{ErrorKind, JobDescriptor, JobEnvelope, JobId, JobKind};
use crate::observability::QueueCounts;
use crate::ports::{Clock, IdGenerator, JobLease, JobQueue, QueueError, SystemClock, UlidGenerator};

/// Scheduled job entry for the retry heap.
///
/// Reverse ordering so BinaryHeap acts as a min-heap (earliest first).
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledJob {
    next_run_at: Instant,
    job_id: JobId,
}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other.next_run_at.cmp(&self.next_run_at)
    }
}

struct QueueState {
    /// All job records (single source of truth).
    records: HashMap<JobId, JobRecord>,

    /// Ready queue (JobIds only).
    ready: VecDeque<JobId>,

    /// Retry backoff queue.
    scheduled: BinaryHeap<ScheduledJob>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            ready: VecDeque::new(),
            scheduled: BinaryHeap::new(),
        }
    }

    /// Move jobs from scheduled to ready if their time has come.
    fn promote_scheduled_jobs(&mut self) {
        let now = Instant::now();
        while let Some(entry) = self.scheduled.peek() {
            if entry.next_run_at > now {
                break;
            }
            let job_id = entry.job_id;
            self.scheduled.pop();
            if let Some(record) = self.records.get_mut(&job_id)
                && record.state == JobState::RetryScheduled
            {
                record.requeue();
                self.ready.push_back(job_id);
            }
        }
    }

    fn counts_by_state(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in self.records.values() {
            match record.state {
                JobState::Queued => counts.queued += 1,
                JobState::Running => counts.running += 1,
                JobState::Succeeded => counts.succeeded += 1,
                JobState::RetryScheduled => counts.retry_scheduled += 1,
                JobState::Dead => counts.dead += 1,
            }
        }
        counts
    }
}

/// In-memory queue implementation.
pub struct InMemoryJobQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    retry_policy: RetryPolicy,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl InMemoryJobQueue {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self::with_clock(retry_policy, SystemClock)
    }

    pub fn with_clock<C: Clock + Clone + 'static>(retry_policy: RetryPolicy, clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::new())),
            notify: Arc::new(Notify::new()),
            retry_policy,
            ids: Box::new(UlidGenerator::new(clock.clone())),
            clock: Box::new(clock),
        }
    }

    /// Snapshot of a job record (status lookups).
    pub async fn record(&self, job_id: JobId) -> Option<JobRecord> {
        self.state.lock().await.records.get(&job_id).cloned()
    }

    /// Jobs that exhausted their attempts.
    pub async fn dead_letters(&self) -> Vec<JobRecord> {
        let state = self.state.lock().await;
        state
            .records
            .values()
            .filter(|record| record.state == JobState::Dead)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(
        &self,
        kind: JobKind,
        descriptor: &JobDescriptor,
    ) -> Result<JobId, QueueError> {
        let payload = serde_json::to_value(descriptor)?;
        let job_id = self.ids.generate_job_id();
        let envelope = JobEnvelope::new(job_id, kind, payload, self.clock.now());

        {
            let mut state = self.state.lock().await;
            state.records.insert(job_id, JobRecord::new(envelope));
            state.ready.push_back(job_id);
        }
        debug!(%job_id, %kind, "job enqueued");
        self.notify.notify_one();

        Ok(job_id)
    }

    async fn lease(&self) -> Option<Box<dyn JobLease>> {
        loop {
            let next_wake = {
                let mut state = self.state.lock().await;
                state.promote_scheduled_jobs();

                while let Some(job_id) = state.ready.pop_front() {
                    if let Some(record) = state.records.get_mut(&job_id) {
                        record.start_attempt();
                        let lease = InMemoryLease {
                            job_id,
                            envelope: record.envelope.clone(),
                            attempt: record.attempts,
                            state: Arc::clone(&self.state),
                            retry_policy: self.retry_policy.clone(),
                            notify: Arc::clone(&self.notify),
                        };
                        return Some(Box::new(lease));
                    }
                }

                state.scheduled.peek().map(|entry| entry.next_run_at)
            };

            // Wait for notification OR next scheduled job time
            if let Some(wake_time) = next_wake {
                tokio::select! {
                    _ = self.notify.notified() => {},
                    _ = tokio::time::sleep_until(wake_time.into()) => {},
                }
            } else {
                self.notify.notified().await;
            }
        }
    }

    async fn counts_by_state(&self) -> Result<QueueCounts, QueueError> {
        Ok(self.state.lock().await.counts_by_state())
    }
}

struct InMemoryLease {
    job_id: JobId,
    envelope: JobEnvelope,
    attempt: u32,
    state: Arc<Mutex<QueueState>>,
    retry_policy: RetryPolicy,
    notify: Arc<Notify>,
}

#[async_trait]
impl JobLease for InMemoryLease {
    fn envelope(&self) -> &JobEnvelope {
        &self.envelope
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let record = state.records.get_mut(&self.job_id).ok_or_else(|| {
            QueueError::OperationFailed(format!("ack for unknown job {}", self.job_id))
        })?;
        record.mark_succeeded();
        Ok(())
    }

    async fn fail(self: Box<Self>, kind: ErrorKind, error: String) -> Result<(), QueueError> {
        let scheduled = {
            let mut state = self.state.lock().await;
            let Some(record) = state.records.get_mut(&self.job_id) else {
                return Err(QueueError::OperationFailed(format!(
                    "fail for unknown job {}",
                    self.job_id
                )));
            };

            if self.retry_policy.is_exhausted(record.attempts) {
                warn!(job_id = %self.job_id, attempts = record.attempts, error = %error, "job dead-lettered");
                record.mark_dead(kind, error);
                false
            } else {
                let delay = self.retry_policy.next_delay(record.attempts);
                let next_run_at = Instant::now() + delay;
                debug!(job_id = %self.job_id, attempts = record.attempts, ?delay, "retry scheduled");
                record.schedule_retry(next_run_at, kind, error);
                state.scheduled.push(ScheduledJob {
                    next_run_at,
                    job_id: self.job_id,
                });
                true
            }
        };

        // Notify outside the lock
        if scheduled {
            self.notify.notify_one();
        }
        Ok(())
    }
}
