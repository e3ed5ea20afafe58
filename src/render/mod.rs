//! Highlight rendering
//!
//! - `engine`: the [`Rendition`] trait the EPUB rendering engine implements
//! - `synchronizer`: keeps engine overlays in step with the mark store

mod engine;
mod synchronizer;

pub use engine::{
    DisplayTarget, EngineError, HighlightStyle, NodeHandle, RenderOptions, Rendition, ThemeMode, ThemeRules,
};
pub use synchronizer::{PaintedMark, RenderSynchronizer};
