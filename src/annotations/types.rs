//! Mark types shared by the reader and the mark service
//!
//! A mark is either a highlight or a bookmark anchored to a CFI. The JSON
//! shape is camelCase with the mark kind under `type`, and the color is
//! stored by palette label with `""` meaning "unset".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::cfi::Cfi;

/// Identifier of a persisted mark
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkId(String);

impl MarkId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MarkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kinds of marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    /// Text highlight with color and comment
    #[default]
    Highlight,
    /// Position marker, never painted
    Bookmark,
}

impl MarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkType::Highlight => "highlight",
            MarkType::Bookmark => "bookmark",
        }
    }
}

impl FromStr for MarkType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highlight" => Ok(MarkType::Highlight),
            "bookmark" => Ok(MarkType::Bookmark),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A string that matched no variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// Highlight palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Purple,
    Blue,
    Cyan,
    Teal,
    Orange,
    BlueGrey,
}

impl Color {
    /// Every palette entry, in display order
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Purple,
        Color::Blue,
        Color::Cyan,
        Color::Teal,
        Color::Orange,
        Color::BlueGrey,
    ];

    /// Stored label
    pub fn label(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Purple => "purple",
            Color::Blue => "blue",
            Color::Cyan => "cyan",
            Color::Teal => "teal",
            Color::Orange => "orange",
            Color::BlueGrey => "blue-grey",
        }
    }

    /// Fill value used when painting
    pub fn value(&self) -> &'static str {
        match self {
            Color::Red => "#F44336",
            Color::Purple => "#9C27B0",
            Color::Blue => "#2196F3",
            Color::Cyan => "#00BCD4",
            Color::Teal => "#009688",
            Color::Orange => "#FF9800",
            Color::BlueGrey => "#607D8B",
        }
    }
}

impl FromStr for Color {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// `Option<Color>` on the wire: `""` is the unset sentinel
pub mod color_field {
    use super::Color;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Option<Color>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(color.map(|c| c.label()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Color>, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if label.is_empty() {
            return Ok(None);
        }
        label.parse().map(Some).map_err(serde::de::Error::custom)
    }

    /// Parse a stored column value
    pub fn parse(label: &str) -> Option<Color> {
        if label.is_empty() {
            None
        } else {
            label.parse().ok()
        }
    }
}

/// Everything about a mark except its identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkFields {
    /// The book this mark belongs to
    pub book_id: String,
    /// Position anchor
    pub epubcfi: Cfi,
    /// Text spanned at creation time
    #[serde(default)]
    pub selected_string: String,
    #[serde(with = "color_field", default)]
    pub color: Option<Color>,
    /// Free-text comment
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub mark_type: MarkType,
    /// Nearest heading at creation time
    #[serde(default)]
    pub title: String,
}

impl MarkFields {
    /// Fresh highlight fields for a selection
    pub fn highlight(book_id: &str, epubcfi: Cfi, selected_string: &str, title: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            epubcfi,
            selected_string: selected_string.to_string(),
            color: None,
            content: String::new(),
            mark_type: MarkType::Highlight,
            title: title.to_string(),
        }
    }

    /// Bookmark fields for a location
    pub fn bookmark(book_id: &str, epubcfi: Cfi, title: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            epubcfi,
            selected_string: String::new(),
            color: None,
            content: String::new(),
            mark_type: MarkType::Bookmark,
            title: title.to_string(),
        }
    }

    /// CSS fill for painting, `None` when the color is unset
    pub fn fill(&self) -> Option<&'static str> {
        self.color.map(|c| c.value())
    }
}

/// A persisted mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: MarkId,
    #[serde(flatten)]
    pub fields: MarkFields,
}

impl Mark {
    pub fn new(id: MarkId, fields: MarkFields) -> Self {
        Self { id, fields }
    }

    pub fn epubcfi(&self) -> &Cfi {
        &self.fields.epubcfi
    }

    pub fn mark_type(&self) -> MarkType {
        self.fields.mark_type
    }
}

/// The value under edit: a draft when `id` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MarkId>,
    #[serde(flatten)]
    pub fields: MarkFields,
}

impl EditorValue {
    pub fn draft(fields: MarkFields) -> Self {
        Self { id: None, fields }
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// The persisted form, if this value has an identifier
    pub fn to_mark(&self) -> Option<Mark> {
        self.id
            .as_ref()
            .map(|id| Mark::new(id.clone(), self.fields.clone()))
    }
}

impl From<Mark> for EditorValue {
    fn from(mark: Mark) -> Self {
        Self {
            id: Some(mark.id),
            fields: mark.fields,
        }
    }
}
