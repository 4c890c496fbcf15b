//! WorkerGroup - lease → handler 実行 → ack/fail のループ
//!
//! - `request_shutdown()` で新しい lease を取らなくなる（実行中の handler は止めない）
//! - 失敗は `AssetJobError::kind()` を添えて queue に返す。retry/dead は queue が決める

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{ErrorKind, JobEnvelope, Outcome};
use crate::ports::JobQueue;
use crate::typed::TypedRegistry;

pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, queue: Arc<dyn JobQueue>, registry: Arc<TypedRegistry>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let reg = Arc::clone(&registry);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, reg, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
    }
}

/// Failure to run one envelope, already classified for the queue.
struct Failure {
    kind: ErrorKind,
    message: String,
}

async fn execute(registry: &TypedRegistry, envelope: &JobEnvelope) -> Result<Outcome, Failure> {
    let Some(handler) = registry.get(envelope.kind()) else {
        return Err(Failure {
            kind: ErrorKind::Permanent,
            message: format!("no handler registered for job kind '{}'", envelope.kind()),
        });
    };

    handler
        .handle_dyn(envelope.payload().clone())
        .await
        .map_err(|err| Failure {
            kind: err.kind(),
            message: err.to_string(),
        })
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn JobQueue>,
    registry: Arc<TypedRegistry>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // lease は待つことがあるので shutdown と競合させる
        let lease = tokio::select! {
            _ = shutdown_rx.changed() => continue,
            lease = queue.lease() => lease,
        };

        let Some(lease) = lease else {
            tokio::task::yield_now().await;
            continue;
        };

        let envelope = lease.envelope().clone();
        let attempt = lease.attempt();

        match execute(&registry, &envelope).await {
            Ok(outcome) => {
                info!(
                    worker_id,
                    job_id = %envelope.job_id(),
                    kind = %envelope.kind(),
                    attempt,
                    outcome = ?outcome.kind,
                    "job finished"
                );
                if let Err(e) = lease.ack().await {
                    error!(worker_id, job_id = %envelope.job_id(), error = %e, "ack failed");
                }
            }
            Err(failure) => {
                warn!(
                    worker_id,
                    job_id = %envelope.job_id(),
                    kind = %envelope.kind(),
                    attempt,
                    error_kind = ?failure.kind,
                    error = %failure.message,
                    "job failed"
                );
                if let Err(e) = lease.fail(failure.kind, failure.message).await {
                    error!(worker_id, job_id = %envelope.job_id(), error = %e, "fail report failed");
                }
            }
        }
    }
}
