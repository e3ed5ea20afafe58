//! Inputs and outputs of a reader session

use serde::{Deserialize, Serialize};

use crate::annotations::Color;
use crate::cfi::{Cfi, RawSelection};
use crate::pipeline::MutationRequest;
use crate::render::NodeHandle;

/// How to open a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderOptions {
    pub book_id: String,
    /// URL of the package document
    pub source_url: String,
    /// Element the engine renders into
    pub container_id: String,
    /// Saved last-read position, empty to open at the start
    #[serde(default)]
    pub current: String,
}

impl ReaderOptions {
    pub fn new(book_id: &str, source_url: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            source_url: source_url.to_string(),
            container_id: "viewer".to_string(),
            current: String::new(),
        }
    }
}

/// Events raised by the rendering engine
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    /// First paint of the document finished
    Displayed,
    /// The user selected text
    Selected(RawSelection),
    /// The document's selection changed
    SelectionChanged,
    /// The user clicked a painted highlight
    MarkClicked { epubcfi: Cfi, node: NodeHandle },
    /// The visible page changed
    Relocated { cfi: String, href: String },
}

/// User actions in the editor popup
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    SetColor(Option<Color>),
    SetContent(String),
    Confirm,
    Delete,
    Cancel,
}

/// Work the session asks its driver to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Execute a mutation and feed the outcome back through `complete`
    Mutate(MutationRequest),
    /// Refetch the mark list and feed it back through `apply_refetch`
    Refetch,
    /// Persist the last-read position
    SavePosition { book_id: String, cfi: Cfi },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
