//! Optimistic mutation pipeline
//!
//! Issues create/update/delete requests, allowing at most one in flight per
//! mark, and executes them against a [`MarkApi`]. Reconciling a result with
//! the editor, store and overlays is the session's job; the pipeline only
//! tracks what is outstanding.

use std::collections::HashMap;

use crate::annotations::{EditorValue, Mark, MarkFields, MarkId};
use crate::api::MarkApi;
use crate::cfi::Cfi;
use crate::editor::DraftKey;

use super::types::{
    MarkKey, Mutation, MutationKind, MutationOutcome, MutationRequest, MutationResponse, PipelineError, Ticket,
};

#[derive(Debug, Default)]
pub struct MutationPipeline {
    in_flight: HashMap<MarkKey, (Ticket, MutationKind)>,
    next_ticket: u64,
}

impl MutationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of request outstanding for `key`, if any
    pub fn in_flight(&self, key: &MarkKey) -> Option<MutationKind> {
        self.in_flight.get(key).map(|(_, kind)| *kind)
    }

    pub fn is_busy(&self, key: &MarkKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    fn issue(&mut self, mutation: Mutation) -> Result<MutationRequest, PipelineError> {
        let key = mutation.key();
        if let Some((_, kind)) = self.in_flight.get(&key) {
            return Err(PipelineError::InFlight {
                key,
                kind: kind.as_str(),
            });
        }

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        tracing::debug!("Issuing {} {:?} for {}", mutation.kind().as_str(), ticket, key);
        self.in_flight.insert(key, (ticket, mutation.kind()));
        Ok(MutationRequest { ticket, mutation })
    }

    /// Persist a draft
    pub fn begin_create(&mut self, key: DraftKey, fields: MarkFields) -> Result<MutationRequest, PipelineError> {
        self.issue(Mutation::Create { key, fields })
    }

    /// Save the editor's value over the persisted mark
    pub fn begin_update(&mut self, value: &EditorValue) -> Result<MutationRequest, PipelineError> {
        let mark = value
            .to_mark()
            .ok_or(PipelineError::MissingIdentifier("update"))?;
        self.issue(Mutation::Update { mark })
    }

    /// Remove a persisted mark
    pub fn begin_delete(&mut self, id: Option<&MarkId>, book_id: &str, epubcfi: &Cfi) -> Result<MutationRequest, PipelineError> {
        let id = id.ok_or(PipelineError::MissingIdentifier("delete"))?;
        self.issue(Mutation::Delete {
            id: id.clone(),
            book_id: book_id.to_string(),
            epubcfi: epubcfi.clone(),
        })
    }

    /// Clear the slot of a finished request.
    ///
    /// Returns false for tickets that are not outstanding.
    pub fn finish(&mut self, request: &MutationRequest) -> bool {
        let key = request.mutation.key();
        match self.in_flight.get(&key) {
            Some((ticket, _)) if *ticket == request.ticket => {
                self.in_flight.remove(&key);
                true
            }
            _ => false,
        }
    }
}

/// Perform a request against the remote API
pub async fn execute<A: MarkApi + ?Sized>(api: &A, request: MutationRequest) -> MutationOutcome {
    let result = match &request.mutation {
        Mutation::Create { fields, .. } => api
            .create(&fields.book_id, fields)
            .await
            .map(MutationResponse::Created),
        Mutation::Update { mark } => api
            .update(&mark.id, &mark.fields.book_id, &mark.fields)
            .await
            .map(|()| MutationResponse::Acknowledged),
        Mutation::Delete { id, book_id, .. } => api
            .delete(id, book_id)
            .await
            .map(|()| MutationResponse::Acknowledged),
    };

    if let Err(e) = &result {
        tracing::warn!("Mark {} failed: {}", request.mutation.kind().as_str(), e);
    }
    MutationOutcome { request, result }
}

/// The persisted mark a successful create produced
pub fn created_mark(request: &MutationRequest, id: &MarkId) -> Option<Mark> {
    match &request.mutation {
        Mutation::Create { fields, .. } => Some(Mark::new(id.clone(), fields.clone())),
        _ => None,
    }
}
