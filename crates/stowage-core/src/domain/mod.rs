//! Domain model (ids, descriptors, modes, outcomes, errors).

pub mod descriptor;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod kind;
pub mod mode;
pub mod outcome;

pub use descriptor::{Embedding, JobDescriptor, NestingDescriptor, OwnerDescriptor};
pub use envelope::JobEnvelope;
pub use errors::{AssetJobError, ErrorKind, Lookup};
pub use ids::{FieldName, JobId, RecordId, TypeName};
pub use kind::JobKind;
pub use mode::SaveMode;
pub use outcome::{Artifact, Outcome, OutcomeKind};
