//! Highlight editor lifecycle
//!
//! - `state`: the Closed / Creating / Editing state machine
//! - `listener`: the single-shot selection-change listener

mod listener;
mod state;

pub use listener::SelectionListener;
pub use state::{Anchor, Draft, DraftKey, EditSession, EditTarget, Editor, EditorMode, EditorState, FieldEdit};
