//! Selection adapter
//!
//! Translates the rendering engine's raw selection report into the values the
//! editor needs: a CFI, the selected text, the selection rectangle and the
//! heading the selection sits under.

use serde::{Deserialize, Serialize};

use super::types::{Cfi, CfiError, Rect};

/// An element on the path from a selection's common ancestor to the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Tag name as reported by the document (case-insensitive)
    pub tag: String,
    /// Text content of the element
    #[serde(default)]
    pub text: String,
}

impl ElementInfo {
    pub fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    /// Whether this element is `h1`..`h6`
    pub fn is_heading(&self) -> bool {
        let tag = self.tag.to_ascii_lowercase();
        let bytes = tag.as_bytes();
        bytes.len() == 2 && bytes[0] == b'h' && (b'1'..=b'6').contains(&bytes[1])
    }
}

/// Selection as reported by the rendering engine's `selected` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    /// CFI range of the selection
    pub cfi_range: String,
    /// `Range::toString()` of the selection
    pub text: String,
    /// Bounding rectangle of the selection
    pub rect: Rect,
    /// Common ancestor first, document root last
    #[serde(default)]
    pub ancestors: Vec<ElementInfo>,
}

/// A selection ready to seed a draft annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub cfi: Cfi,
    pub selected_text: String,
    pub rect: Rect,
    pub context_heading: String,
}

/// Walk upward from the common ancestor and return the first heading's text
pub fn context_heading(ancestors: &[ElementInfo]) -> String {
    ancestors
        .iter()
        .find(|el| el.is_heading())
        .map(|el| el.text.trim().to_string())
        .unwrap_or_default()
}

/// Convert a raw engine selection into a [`Selection`]
pub fn selection_from(raw: RawSelection) -> Result<Selection, CfiError> {
    let context_heading = context_heading(&raw.ancestors);
    Ok(Selection {
        cfi: Cfi::new(raw.cfi_range)?,
        selected_text: raw.text,
        rect: raw.rect,
        context_heading,
    })
}
