//! Rendering engine boundary
//!
//! The engine lays out and paginates the EPUB and owns the live overlay
//! nodes. The reader drives it only through [`Rendition`].

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::cfi::Cfi;

/// Opaque handle to an overlay node owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u64);

/// Visual attributes of a highlight overlay
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightStyle {
    /// CSS fill, engine default when `None`
    pub fill: Option<String>,
}

impl HighlightStyle {
    pub fn with_fill(fill: Option<&str>) -> Self {
        Self {
            fill: fill.map(str::to_string),
        }
    }
}

/// Options passed to `render`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOptions {
    pub manager: String,
    pub flow: String,
    pub width: String,
    pub height: String,
    pub snap: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            manager: "continuous".to_string(),
            flow: "paginated".to_string(),
            width: "100%".to_string(),
            height: "100%".to_string(),
            snap: true,
        }
    }
}

/// Where to open the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTarget {
    Cfi(Cfi),
    Offset(u32),
}

impl DisplayTarget {
    /// Stored position, or the start of the book when none was saved
    pub fn from_saved(current: &str) -> Self {
        match Cfi::new(current) {
            Ok(cfi) => DisplayTarget::Cfi(cfi),
            Err(_) => DisplayTarget::Offset(0),
        }
    }
}

/// Style rules of a theme: selector -> property -> value
pub type ThemeRules = BTreeMap<String, BTreeMap<String, String>>;

/// Registered reader themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn name(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn rules(&self) -> ThemeRules {
        match self {
            ThemeMode::Light => ThemeRules::new(),
            ThemeMode::Dark => {
                let mut body = BTreeMap::new();
                body.insert("color".to_string(), "white".to_string());
                let mut rules = ThemeRules::new();
                rules.insert("body".to_string(), body);
                rules
            }
        }
    }
}

/// Engine failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The CFI does not map to content that is currently rendered
    #[error("CFI not resolvable: {0}")]
    Unresolved(String),

    #[error("overlay node {0:?} no longer exists")]
    StaleNode(NodeHandle),

    #[error("theme not registered: {0}")]
    UnknownTheme(String),

    #[error("rendering engine has been destroyed")]
    Destroyed,

    #[error("rendering engine error: {0}")]
    Other(String),
}

/// Operations the reader needs from a rendering engine
pub trait Rendition {
    fn render(&mut self, container_id: &str, source_url: &str, options: &RenderOptions) -> Result<(), EngineError>;

    fn display(&mut self, target: &DisplayTarget) -> Result<(), EngineError>;

    fn next(&mut self) -> Result<(), EngineError>;

    fn prev(&mut self) -> Result<(), EngineError>;

    fn register_theme(&mut self, name: &str, rules: &ThemeRules);

    fn use_theme(&mut self, name: &str) -> Result<(), EngineError>;

    /// Draw a highlight overlay for `cfi`
    fn add_highlight(&mut self, cfi: &Cfi, style: &HighlightStyle) -> Result<NodeHandle, EngineError>;

    /// Change an existing overlay's attributes in place
    fn update_highlight(&mut self, node: NodeHandle, style: &HighlightStyle) -> Result<(), EngineError>;

    fn remove_highlight(&mut self, node: NodeHandle) -> Result<(), EngineError>;

    /// Detach from the container and drop every listener
    fn destroy(&mut self);
}
