//! Marks: highlights and bookmarks anchored by CFI
//!
//! - `types`: the mark data model and its JSON shape
//! - `store`: the reader's in-memory mirror of a book's marks

mod store;
mod types;

pub use store::AnnotationStore;
pub use types::{color_field, Color, EditorValue, Mark, MarkFields, MarkId, MarkType, UnknownVariant};
