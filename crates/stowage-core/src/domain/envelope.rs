use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobKind};

/// JobKind + payload (+ JobId) の“運搬用”データ。
///
/// payload は `JobDescriptor` を JSON にしたもの。queue は中身を解釈しない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    job_id: JobId,
    kind: JobKind,
    payload: serde_json::Value,
    enqueued_at: DateTime<Utc>,
}

impl JobEnvelope {
    pub fn new(
        job_id: JobId,
        kind: JobKind,
        payload: serde_json::Value,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            kind,
            payload,
            enqueued_at,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}
