//! Create / update / delete of marks against the remote API

mod mutations;
mod types;

pub use mutations::{created_mark, execute, MutationPipeline};
pub use types::{MarkKey, Mutation, MutationKind, MutationOutcome, MutationRequest, MutationResponse, PipelineError, Ticket};
