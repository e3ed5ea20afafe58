//! Mutation requests and their outcomes

use std::fmt;
use thiserror::Error;

use crate::annotations::{Mark, MarkFields, MarkId};
use crate::api::ApiError;
use crate::cfi::Cfi;
use crate::editor::DraftKey;

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// The mark a request is about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkKey {
    Draft(DraftKey),
    Persisted(MarkId),
}

impl fmt::Display for MarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkKey::Draft(key) => write!(f, "{}", key),
            MarkKey::Persisted(id) => write!(f, "mark {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

/// A remote change
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Persist a draft; the fields carry no identifier
    Create { key: DraftKey, fields: MarkFields },
    /// Replace a persisted mark's fields
    Update { mark: Mark },
    /// Remove a persisted mark
    Delete { id: MarkId, book_id: String, epubcfi: Cfi },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create { .. } => MutationKind::Create,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    pub fn key(&self) -> MarkKey {
        match self {
            Mutation::Create { key, .. } => MarkKey::Draft(*key),
            Mutation::Update { mark } => MarkKey::Persisted(mark.id.clone()),
            Mutation::Delete { id, .. } => MarkKey::Persisted(id.clone()),
        }
    }
}

/// A request issued by the pipeline and awaiting execution
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub ticket: Ticket,
    pub mutation: Mutation,
}

/// Successful remote response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResponse {
    Created(MarkId),
    Acknowledged,
}

/// A request together with its remote result
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub request: MutationRequest,
    pub result: Result<MutationResponse, ApiError>,
}

/// Reasons the pipeline refuses to issue a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Update or delete of a mark that was never persisted
    #[error("{0} requires a persisted mark")]
    MissingIdentifier(&'static str),

    #[error("a {kind} is already in flight for {key}")]
    InFlight { key: MarkKey, kind: &'static str },
}
