//! Highlight editor state machine
//!
//! ```text
//!            selection                 click on highlight
//!   Closed ─────────────▶ Creating ───────────────────────▶ Editing
//!     ▲                      │  create confirmed (promote)     │ ▲
//!     │                      └────────────────────────────────▶│ │ click
//!     └──────────── cancel / confirmed / deleted / navigate ───┴─┘
//! ```
//!
//! The editor holds a transient copy of one mark. Nothing here talks to the
//! engine or the network; the session turns transitions into effects.

use std::fmt;

use crate::annotations::{Color, EditorValue, Mark, MarkFields, MarkId};
use crate::cfi::{Rect, Selection};
use crate::pipeline::Ticket;
use crate::render::NodeHandle;

/// Identity of a draft for its lifetime in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey(pub u64);

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft-{}", self.0)
    }
}

/// What the editor popup is positioned against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Selection rectangle of a new selection
    Rect(Rect),
    /// Overlay node of a clicked highlight
    Node(NodeHandle),
}

/// A mark being created, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub key: DraftKey,
    pub anchor: Anchor,
    pub fields: MarkFields,
}

/// An existing mark being edited
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub id: MarkId,
    pub anchor: Anchor,
    pub fields: MarkFields,
    /// Value when editing began, restored on cancel
    pub snapshot: Mark,
    /// Update issued from this session by confirm
    pub confirming: Option<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    Creating(Draft),
    Editing(EditSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Closed,
    Creating,
    Editing,
}

/// A single field change made in the popup
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Color(Option<Color>),
    Content(String),
}

impl FieldEdit {
    fn apply(self, fields: &mut MarkFields) {
        match self {
            FieldEdit::Color(color) => fields.color = color,
            FieldEdit::Content(content) => fields.content = content,
        }
    }
}

/// Which mark an edit landed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Draft(DraftKey),
    Existing(MarkId),
}

/// Editor for one reader session
#[derive(Debug)]
pub struct Editor {
    book_id: String,
    state: EditorState,
    next_draft: u64,
}

impl Editor {
    pub fn new(book_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            state: EditorState::Closed,
            next_draft: 0,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn mode(&self) -> EditorMode {
        match self.state {
            EditorState::Closed => EditorMode::Closed,
            EditorState::Creating(_) => EditorMode::Creating,
            EditorState::Editing(_) => EditorMode::Editing,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditorState::Closed)
    }

    /// Current value, if the editor is open
    pub fn value(&self) -> Option<EditorValue> {
        match &self.state {
            EditorState::Closed => None,
            EditorState::Creating(draft) => Some(EditorValue::draft(draft.fields.clone())),
            EditorState::Editing(session) => Some(EditorValue {
                id: Some(session.id.clone()),
                fields: session.fields.clone(),
            }),
        }
    }

    pub fn anchor(&self) -> Option<Anchor> {
        match &self.state {
            EditorState::Closed => None,
            EditorState::Creating(draft) => Some(draft.anchor),
            EditorState::Editing(session) => Some(session.anchor),
        }
    }

    pub fn draft_key(&self) -> Option<DraftKey> {
        match &self.state {
            EditorState::Creating(draft) => Some(draft.key),
            _ => None,
        }
    }

    pub fn editing_id(&self) -> Option<&MarkId> {
        match &self.state {
            EditorState::Editing(session) => Some(&session.id),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&Mark> {
        match &self.state {
            EditorState::Editing(session) => Some(&session.snapshot),
            _ => None,
        }
    }

    /// Record the update confirm issued for the open edit
    pub fn mark_confirming(&mut self, ticket: Ticket) {
        if let EditorState::Editing(session) = &mut self.state {
            session.confirming = Some(ticket);
        }
    }

    /// Ticket of the open edit's confirm, if any
    pub fn confirming(&self) -> Option<Ticket> {
        match &self.state {
            EditorState::Editing(session) => session.confirming,
            _ => None,
        }
    }

    /// Allocate a draft key, also used for marks created outside the popup
    pub fn next_key(&mut self) -> DraftKey {
        self.next_draft += 1;
        DraftKey(self.next_draft)
    }

    /// Open a fresh draft for a new selection.
    ///
    /// Whatever was open is discarded without saving.
    pub fn open_draft(&mut self, selection: &Selection) -> DraftKey {
        let key = self.next_key();
        let fields = MarkFields::highlight(
            &self.book_id,
            selection.cfi.clone(),
            &selection.selected_text,
            &selection.context_heading,
        );

        if self.is_open() {
            tracing::debug!("Discarding open editor for new selection at {}", selection.cfi);
        }
        tracing::debug!("Editor creating {} at {}", key, selection.cfi);
        self.state = EditorState::Creating(Draft {
            key,
            anchor: Anchor::Rect(selection.rect),
            fields,
        });
        key
    }

    /// Open an existing mark; the most recent call wins
    pub fn open_existing(&mut self, mark: Mark, anchor: Anchor) {
        tracing::debug!("Editor editing mark {}", mark.id);
        self.state = EditorState::Editing(EditSession {
            id: mark.id.clone(),
            anchor,
            fields: mark.fields.clone(),
            snapshot: mark,
            confirming: None,
        });
    }

    /// Apply a field edit to whatever is open
    pub fn apply(&mut self, edit: FieldEdit) -> Option<EditTarget> {
        match &mut self.state {
            EditorState::Closed => None,
            EditorState::Creating(draft) => {
                edit.apply(&mut draft.fields);
                Some(EditTarget::Draft(draft.key))
            }
            EditorState::Editing(session) => {
                edit.apply(&mut session.fields);
                Some(EditTarget::Existing(session.id.clone()))
            }
        }
    }

    /// Turn the draft `key` into an edit of the persisted mark.
    ///
    /// `persisted` is what the server holds and becomes the cancel snapshot.
    /// Returns the editor's current value, which may include edits made
    /// while the create was in flight. `None` when `key` is no longer open.
    pub fn promote(&mut self, key: DraftKey, persisted: &Mark) -> Option<Mark> {
        let draft = match &self.state {
            EditorState::Creating(draft) if draft.key == key => draft.clone(),
            _ => return None,
        };

        tracing::debug!("Editor promoted {} to mark {}", key, persisted.id);
        let current = Mark::new(persisted.id.clone(), draft.fields.clone());
        self.state = EditorState::Editing(EditSession {
            id: persisted.id.clone(),
            anchor: draft.anchor,
            fields: draft.fields,
            snapshot: persisted.clone(),
            confirming: None,
        });
        Some(current)
    }

    /// Close the editor, returning what was open
    pub fn close(&mut self) -> EditorState {
        std::mem::take(&mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::MarkType;
    use crate::cfi::Cfi;

    fn selection(cfi: &str, x: f64) -> Selection {
        Selection {
            cfi: Cfi::new(cfi).unwrap(),
            selected_text: "selected".to_string(),
            rect: Rect::new(x, 0.0, 50.0, 10.0),
            context_heading: "Heading".to_string(),
        }
    }

    fn existing(id: &str) -> Mark {
        let mut fields = MarkFields::highlight("book-1", Cfi::new("epubcfi-7").unwrap(), "old", "");
        fields.color = Some(Color::Red);
        Mark::new(MarkId::from(id), fields)
    }

    #[test]
    fn test_selection_opens_draft() {
        let mut editor = Editor::new("book-1");
        assert_eq!(editor.mode(), EditorMode::Closed);

        let key = editor.open_draft(&selection("epubcfi-42", 5.0));

        assert_eq!(editor.mode(), EditorMode::Creating);
        assert_eq!(editor.draft_key(), Some(key));
        assert_eq!(editor.anchor(), Some(Anchor::Rect(Rect::new(5.0, 0.0, 50.0, 10.0))));

        let value = editor.value().unwrap();
        assert!(value.is_draft());
        assert_eq!(value.fields.epubcfi.as_str(), "epubcfi-42");
        assert_eq!(value.fields.selected_string, "selected");
        assert_eq!(value.fields.title, "Heading");
        assert_eq!(value.fields.mark_type, MarkType::Highlight);
        assert_eq!(value.fields.color, None);
        assert_eq!(value.fields.book_id, "book-1");
    }

    #[test]
    fn test_second_selection_wins() {
        let mut editor = Editor::new("book-1");
        let first = editor.open_draft(&selection("epubcfi-1", 1.0));
        editor.apply(FieldEdit::Color(Some(Color::Red)));
        let second = editor.open_draft(&selection("epubcfi-2", 2.0));

        assert_ne!(first, second);
        let value = editor.value().unwrap();
        assert_eq!(value.fields.epubcfi.as_str(), "epubcfi-2");
        assert_eq!(value.fields.color, None);
        assert_eq!(editor.anchor(), Some(Anchor::Rect(Rect::new(2.0, 0.0, 50.0, 10.0))));
    }

    #[test]
    fn test_selection_replaces_existing_edit() {
        let mut editor = Editor::new("book-1");
        editor.open_existing(existing("7"), Anchor::Node(NodeHandle(1)));
        editor.open_draft(&selection("epubcfi-3", 0.0));

        assert_eq!(editor.mode(), EditorMode::Creating);
        assert!(editor.value().unwrap().id.is_none());
    }

    #[test]
    fn test_click_opens_and_last_click_wins() {
        let mut editor = Editor::new("book-1");
        editor.open_existing(existing("7"), Anchor::Node(NodeHandle(1)));
        editor.open_existing(existing("8"), Anchor::Node(NodeHandle(2)));

        assert_eq!(editor.editing_id().unwrap().as_str(), "8");
        assert_eq!(editor.anchor(), Some(Anchor::Node(NodeHandle(2))));
        assert_eq!(editor.snapshot().unwrap().id.as_str(), "8");
    }

    #[test]
    fn test_edits_keep_snapshot() {
        let mut editor = Editor::new("book-1");
        editor.open_existing(existing("7"), Anchor::Node(NodeHandle(1)));

        let target = editor.apply(FieldEdit::Color(Some(Color::Blue)));
        editor.apply(FieldEdit::Content("comment".to_string()));

        assert_eq!(target, Some(EditTarget::Existing(MarkId::from("7"))));
        let value = editor.value().unwrap();
        assert_eq!(value.fields.color, Some(Color::Blue));
        assert_eq!(value.fields.content, "comment");
        assert_eq!(editor.snapshot().unwrap().fields.color, Some(Color::Red));
    }

    #[test]
    fn test_promote_keeps_in_flight_edits() {
        let mut editor = Editor::new("book-1");
        let key = editor.open_draft(&selection("epubcfi-42", 0.0));
        editor.apply(FieldEdit::Color(Some(Color::Red)));
        let sent = Mark::new(MarkId::from("11"), editor.value().unwrap().fields);
        editor.apply(FieldEdit::Color(Some(Color::Teal)));

        let current = editor.promote(key, &sent).unwrap();

        assert_eq!(editor.mode(), EditorMode::Editing);
        assert_eq!(current.fields.color, Some(Color::Teal));
        assert_eq!(editor.snapshot().unwrap().fields.color, Some(Color::Red));
        assert_eq!(editor.editing_id().unwrap().as_str(), "11");
    }

    #[test]
    fn test_promote_stale_draft_ignored() {
        let mut editor = Editor::new("book-1");
        let stale = editor.open_draft(&selection("epubcfi-1", 0.0));
        editor.open_draft(&selection("epubcfi-2", 0.0));

        assert!(editor.promote(stale, &existing("5")).is_none());
        assert_eq!(editor.mode(), EditorMode::Creating);
    }

    #[test]
    fn test_close_returns_previous_state() {
        let mut editor = Editor::new("book-1");
        editor.open_existing(existing("7"), Anchor::Node(NodeHandle(1)));

        let previous = editor.close();

        assert!(matches!(previous, EditorState::Editing(_)));
        assert!(!editor.is_open());
        assert!(editor.apply(FieldEdit::Content("ignored".to_string())).is_none());
    }
}
