//! Test doubles: an in-memory rendering engine and a recording mark API

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::annotations::{Mark, MarkFields, MarkId, MarkType};
use crate::api::{ApiError, MarkApi};
use crate::cfi::Cfi;
use crate::render::{DisplayTarget, EngineError, HighlightStyle, NodeHandle, RenderOptions, Rendition, ThemeRules};

#[derive(Debug, Default)]
pub struct EngineState {
    pub rendered: Option<(String, String)>,
    pub displayed: Vec<DisplayTarget>,
    pub page_turns: i32,
    pub themes: HashMap<String, ThemeRules>,
    pub active_theme: Option<String>,
    pub nodes: HashMap<NodeHandle, (Cfi, HighlightStyle)>,
    pub next_node: u64,
    pub add_calls: usize,
    pub unresolvable: HashSet<String>,
    pub destroyed: bool,
}

/// Rendering engine that records what it was asked to draw
#[derive(Debug, Clone, Default)]
pub struct FakeRendition {
    state: Arc<Mutex<EngineState>>,
}

impl FakeRendition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }

    pub fn nodes_at(&self, cfi: &str) -> usize {
        self.state()
            .nodes
            .values()
            .filter(|(c, _)| c.as_str() == cfi)
            .count()
    }

    pub fn node_at(&self, cfi: &str) -> Option<NodeHandle> {
        self.state()
            .nodes
            .iter()
            .find(|(_, (c, _))| c.as_str() == cfi)
            .map(|(node, _)| *node)
    }

    pub fn fill_at(&self, cfi: &str) -> Option<String> {
        self.state()
            .nodes
            .values()
            .find(|(c, _)| c.as_str() == cfi)
            .and_then(|(_, style)| style.fill.clone())
    }

    pub fn node_count(&self) -> usize {
        self.state().nodes.len()
    }

    pub fn add_calls(&self) -> usize {
        self.state().add_calls
    }

    pub fn active_theme(&self) -> Option<String> {
        self.state().active_theme.clone()
    }

    pub fn destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Pretend the page holding `cfi` is not mounted
    pub fn make_unresolvable(&self, cfi: &str) {
        self.state().unresolvable.insert(cfi.to_string());
    }

    /// Pretend the page holding `cfi` has been mounted
    pub fn make_resolvable(&self, cfi: &str) {
        self.state().unresolvable.remove(cfi);
    }

    /// Simulate the engine re-rendering and dropping every overlay
    pub fn drop_nodes(&self) {
        self.state().nodes.clear();
    }
}

impl Rendition for FakeRendition {
    fn render(&mut self, container_id: &str, source_url: &str, _options: &RenderOptions) -> Result<(), EngineError> {
        self.state().rendered = Some((container_id.to_string(), source_url.to_string()));
        Ok(())
    }

    fn display(&mut self, target: &DisplayTarget) -> Result<(), EngineError> {
        self.state().displayed.push(target.clone());
        Ok(())
    }

    fn next(&mut self) -> Result<(), EngineError> {
        self.state().page_turns += 1;
        Ok(())
    }

    fn prev(&mut self) -> Result<(), EngineError> {
        self.state().page_turns -= 1;
        Ok(())
    }

    fn register_theme(&mut self, name: &str, rules: &ThemeRules) {
        self.state().themes.insert(name.to_string(), rules.clone());
    }

    fn use_theme(&mut self, name: &str) -> Result<(), EngineError> {
        let mut state = self.state();
        if !state.themes.contains_key(name) {
            return Err(EngineError::UnknownTheme(name.to_string()));
        }
        state.active_theme = Some(name.to_string());
        Ok(())
    }

    fn add_highlight(&mut self, cfi: &Cfi, style: &HighlightStyle) -> Result<NodeHandle, EngineError> {
        let mut state = self.state();
        if state.destroyed {
            return Err(EngineError::Destroyed);
        }
        if state.unresolvable.contains(cfi.as_str()) {
            return Err(EngineError::Unresolved(cfi.to_string()));
        }
        state.add_calls += 1;
        state.next_node += 1;
        let node = NodeHandle(state.next_node);
        state.nodes.insert(node, (cfi.clone(), style.clone()));
        Ok(node)
    }

    fn update_highlight(&mut self, node: NodeHandle, style: &HighlightStyle) -> Result<(), EngineError> {
        let mut state = self.state();
        match state.nodes.get_mut(&node) {
            Some((_, current)) => {
                *current = style.clone();
                Ok(())
            }
            None => Err(EngineError::StaleNode(node)),
        }
    }

    fn remove_highlight(&mut self, node: NodeHandle) -> Result<(), EngineError> {
        self.state()
            .nodes
            .remove(&node)
            .map(|_| ())
            .ok_or(EngineError::StaleNode(node))
    }

    fn destroy(&mut self) {
        let mut state = self.state();
        state.destroyed = true;
        state.nodes.clear();
    }
}

/// A call received by [`MockMarkApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Create(MarkFields),
    Update(MarkId, MarkFields),
    Delete(MarkId),
    List(Option<MarkType>),
    Current,
    SavePosition(String),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<ApiCall>,
    marks: Vec<Mark>,
    next_id: u64,
    current: String,
    fail_create: Option<ApiError>,
    fail_update: Option<ApiError>,
    fail_delete: Option<ApiError>,
}

/// In-memory mark API that records every call
#[derive(Debug, Clone, Default)]
pub struct MockMarkApi {
    state: Arc<Mutex<MockState>>,
}

impl MockMarkApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Start identifiers after `n`
    pub fn with_next_id(self, n: u64) -> Self {
        self.state().next_id = n;
        self
    }

    pub fn seed(&self, marks: Vec<Mark>) {
        self.state().marks = marks;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn creates(&self) -> Vec<MarkFields> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Create(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::Update(..)))
            .count()
    }

    pub fn marks(&self) -> Vec<Mark> {
        self.state().marks.clone()
    }

    pub fn fail_creates(&self, error: ApiError) {
        self.state().fail_create = Some(error);
    }

    pub fn fail_updates(&self, error: ApiError) {
        self.state().fail_update = Some(error);
    }

    pub fn fail_deletes(&self, error: ApiError) {
        self.state().fail_delete = Some(error);
    }

    pub fn recover(&self) {
        let mut state = self.state();
        state.fail_create = None;
        state.fail_update = None;
        state.fail_delete = None;
    }
}

#[async_trait]
impl MarkApi for MockMarkApi {
    async fn create(&self, _book_id: &str, fields: &MarkFields) -> Result<MarkId, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::Create(fields.clone()));
        if let Some(e) = state.fail_create.clone() {
            return Err(e);
        }
        state.next_id += 1;
        let id = MarkId::from(state.next_id.to_string());
        state.marks.push(Mark::new(id.clone(), fields.clone()));
        Ok(id)
    }

    async fn update(&self, id: &MarkId, _book_id: &str, fields: &MarkFields) -> Result<(), ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::Update(id.clone(), fields.clone()));
        if let Some(e) = state.fail_update.clone() {
            return Err(e);
        }
        let mark = state
            .marks
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        mark.fields = fields.clone();
        Ok(())
    }

    async fn delete(&self, id: &MarkId, _book_id: &str) -> Result<(), ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::Delete(id.clone()));
        if let Some(e) = state.fail_delete.clone() {
            return Err(e);
        }
        state.marks.retain(|m| &m.id != id);
        Ok(())
    }

    async fn list(&self, book_id: &str, mark_type: Option<MarkType>) -> Result<Vec<Mark>, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::List(mark_type));
        Ok(state
            .marks
            .iter()
            .filter(|m| m.fields.book_id == book_id)
            .filter(|m| mark_type.map_or(true, |t| m.mark_type() == t))
            .cloned()
            .collect())
    }

    async fn current(&self, _book_id: &str) -> Result<String, ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::Current);
        Ok(state.current.clone())
    }

    async fn save_position(&self, _book_id: &str, cfi: &Cfi) -> Result<(), ApiError> {
        let mut state = self.state();
        state.calls.push(ApiCall::SavePosition(cfi.to_string()));
        state.current = cfi.to_string();
        Ok(())
    }
}
