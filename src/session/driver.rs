//! Executes session effects against a [`MarkApi`]

use std::collections::VecDeque;

use crate::annotations::Mark;
use crate::api::{ApiError, MarkApi};
use crate::pipeline;
use crate::render::{EngineError, Rendition};

use super::events::{Effect, ReaderOptions};
use super::reader::ReaderSession;

/// Errors opening a book
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("failed to load marks: {0}")]
    Api(#[from] ApiError),

    #[error("failed to render book: {0}")]
    Engine(#[from] EngineError),
}

/// Fetch the saved position and mark list, then mount the reader
pub async fn open<R, A>(engine: R, mut options: ReaderOptions, api: &A) -> Result<ReaderSession<R>, OpenError>
where
    R: Rendition,
    A: MarkApi + ?Sized,
{
    options.current = api.current(&options.book_id).await?;
    let marks: Vec<Mark> = api.list(&options.book_id, None).await?;
    Ok(ReaderSession::mount(engine, &options, marks)?)
}

/// Run `effects` to completion, one at a time.
///
/// Effects produced while reconciling are queued behind the current batch.
/// Failures of refetch and position saves are logged and otherwise ignored.
pub async fn drive<R, A>(session: &mut ReaderSession<R>, api: &A, effects: Vec<Effect>)
where
    R: Rendition,
    A: MarkApi + ?Sized,
{
    let mut queue: VecDeque<Effect> = effects.into();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Mutate(request) => {
                let outcome = pipeline::execute(api, request).await;
                queue.extend(session.complete(outcome));
            }
            Effect::Refetch => {
                let listed = api.list(session.book_id(), None).await;
                match listed {
                    Ok(marks) => session.apply_refetch(marks),
                    Err(e) => tracing::warn!("Failed to refetch marks for {}: {}", session.book_id(), e),
                }
            }
            Effect::SavePosition { book_id, cfi } => {
                if let Err(e) = api.save_position(&book_id, &cfi).await {
                    tracing::warn!("Failed to save position {} for {}: {}", cfi, book_id, e);
                }
            }
        }
    }
}
