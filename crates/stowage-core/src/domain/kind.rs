use serde::{Deserialize, Serialize};
use std::fmt;

/// Job kind tag carried with every enqueued descriptor.
///
/// Serialized as `"process"` / `"store"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Regenerate derived versions of an already-stored asset.
    Process,
    /// Promote a cached upload into permanent storage.
    Store,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Process => "process",
            JobKind::Store => "store",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
