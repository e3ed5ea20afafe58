//! Keeps engine overlays consistent with the mark store
//!
//! The synchronizer owns the engine for the lifetime of a reader session and
//! an explicit CFI -> overlay map, so overlays never carry mark fields in
//! markup. Highlights the engine cannot resolve yet are parked as pending:
//! the page holding them may simply not be mounted. They are retried with
//! [`RenderSynchronizer::retry_pending`] whenever the engine moves.

use std::collections::HashMap;

use crate::annotations::{Mark, MarkType};
use crate::cfi::Cfi;

use super::engine::{EngineError, HighlightStyle, NodeHandle, Rendition, ThemeMode};

/// An overlay currently drawn by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedMark {
    pub node: NodeHandle,
    pub mark: Mark,
}

/// Render synchronizer for one engine instance
pub struct RenderSynchronizer<R: Rendition> {
    /// `None` once the session has been torn down
    engine: Option<R>,
    painted: HashMap<Cfi, PaintedMark>,
    /// Highlights waiting for their page to be mounted
    pending: HashMap<Cfi, Mark>,
    initial_paint_done: bool,
    theme: Option<ThemeMode>,
}

impl<R: Rendition> RenderSynchronizer<R> {
    pub fn new(engine: R) -> Self {
        Self {
            engine: Some(engine),
            painted: HashMap::new(),
            pending: HashMap::new(),
            initial_paint_done: false,
            theme: None,
        }
    }

    /// Whether the engine is still attached
    pub fn is_live(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&R> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut R> {
        self.engine.as_mut()
    }

    /// Draw or update the overlay for a persisted highlight.
    ///
    /// Repainting a CFI updates the existing node. Returns whether an
    /// overlay reflects `mark` afterwards.
    pub fn paint(&mut self, mark: &Mark) -> bool {
        if mark.mark_type() == MarkType::Bookmark {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            tracing::debug!("Skipping paint of {}: engine detached", mark.epubcfi());
            return false;
        };

        let style = HighlightStyle::with_fill(mark.fields.fill());
        let cfi = mark.epubcfi().clone();

        if let Some(existing) = self.painted.get_mut(&cfi) {
            match engine.update_highlight(existing.node, &style) {
                Ok(()) => {
                    existing.mark = mark.clone();
                    return true;
                }
                Err(EngineError::StaleNode(node)) => {
                    tracing::debug!("Overlay {:?} for {} went stale, redrawing", node, cfi);
                    self.painted.remove(&cfi);
                }
                Err(e) => {
                    tracing::warn!("Failed to update highlight {}: {}", cfi, e);
                    return false;
                }
            }
        }

        match engine.add_highlight(&cfi, &style) {
            Ok(node) => {
                self.pending.remove(&cfi);
                self.painted.insert(
                    cfi,
                    PaintedMark {
                        node,
                        mark: mark.clone(),
                    },
                );
                true
            }
            Err(EngineError::Unresolved(_)) => {
                tracing::debug!("Highlight {} not on a mounted page, deferring", cfi);
                self.pending.insert(cfi, mark.clone());
                false
            }
            Err(e) => {
                tracing::warn!("Failed to paint highlight {}: {}", cfi, e);
                false
            }
        }
    }

    /// Try again to paint highlights whose page was not mounted.
    ///
    /// Returns how many were drawn.
    pub fn retry_pending(&mut self) -> usize {
        if self.pending.is_empty() || !self.is_live() {
            return 0;
        }
        let waiting: Vec<Mark> = self.pending.values().cloned().collect();
        let painted = waiting.iter().filter(|m| self.paint(m)).count();
        if painted > 0 {
            tracing::debug!("Painted {} deferred highlights, {} still pending", painted, self.pending.len());
        }
        painted
    }

    /// Repaint only if an overlay already exists for the mark's CFI
    pub fn repaint(&mut self, mark: &Mark) -> bool {
        if !self.painted.contains_key(mark.epubcfi()) {
            return false;
        }
        self.paint(mark)
    }

    /// Remove the overlay at `cfi`; absent overlays are a no-op
    pub fn remove(&mut self, cfi: &Cfi) -> bool {
        self.pending.remove(cfi);
        let Some(painted) = self.painted.remove(cfi) else {
            return false;
        };
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        if let Err(e) = engine.remove_highlight(painted.node) {
            tracing::warn!("Failed to remove highlight {}: {}", cfi, e);
        }
        true
    }

    /// Paint a mount's highlight list; later calls do nothing
    pub fn paint_initial<'a>(&mut self, marks: impl IntoIterator<Item = &'a Mark>) -> usize {
        if self.initial_paint_done || !self.is_live() {
            return 0;
        }
        self.initial_paint_done = true;

        let painted = marks.into_iter().filter(|m| self.paint(m)).count();
        tracing::debug!("Initial paint drew {} highlights", painted);
        painted
    }

    /// Register the light and dark themes with the engine
    pub fn register_themes(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            for mode in [ThemeMode::Light, ThemeMode::Dark] {
                engine.register_theme(mode.name(), &mode.rules());
            }
        }
    }

    /// Switch theme; overlay fills are left alone
    pub fn apply_theme(&mut self, mode: ThemeMode) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.use_theme(mode.name()) {
            Ok(()) => self.theme = Some(mode),
            Err(e) => tracing::warn!("Failed to apply theme {}: {}", mode.name(), e),
        }
    }

    pub fn theme(&self) -> Option<ThemeMode> {
        self.theme
    }

    /// Resolve a CFI to its overlay node
    pub fn anchor_for(&self, cfi: &Cfi) -> Option<NodeHandle> {
        self.painted.get(cfi).map(|p| p.node)
    }

    /// The mark an overlay was last painted with
    pub fn painted_mark(&self, cfi: &Cfi) -> Option<&Mark> {
        self.painted.get(cfi).map(|p| &p.mark)
    }

    /// Find the overlay owning a node
    pub fn mark_for_node(&self, node: NodeHandle) -> Option<&Mark> {
        self.painted
            .values()
            .find(|p| p.node == node)
            .map(|p| &p.mark)
    }

    pub fn painted_count(&self) -> usize {
        self.painted.len()
    }

    /// CFIs that currently carry an overlay
    pub fn painted_cfis(&self) -> Vec<Cfi> {
        self.painted.keys().cloned().collect()
    }

    /// CFIs of highlights still waiting to be painted
    pub fn pending_cfis(&self) -> Vec<Cfi> {
        self.pending.keys().cloned().collect()
    }

    pub fn initial_paint_done(&self) -> bool {
        self.initial_paint_done
    }

    /// Destroy the engine; every later call becomes a no-op
    pub fn detach(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        self.painted.clear();
        self.pending.clear();
    }
}
