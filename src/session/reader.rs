//! Reader session
//!
//! One session per open book. It owns the engine (through the render
//! synchronizer), the mark store, the editor, the selection listener and the
//! mutation pipeline. Handlers run to completion on the caller's thread and
//! return the [`Effect`]s to perform; remote results come back through
//! [`ReaderSession::complete`] and [`ReaderSession::apply_refetch`].

use crate::annotations::{AnnotationStore, Mark, MarkFields, MarkId, MarkType};
use crate::api::ApiError;
use crate::cfi::{self, Cfi, RawSelection};
use crate::editor::{Anchor, EditTarget, Editor, EditorState, FieldEdit, SelectionListener};
use crate::pipeline::{
    created_mark, MarkKey, Mutation, MutationKind, MutationOutcome, MutationPipeline, MutationRequest,
    MutationResponse, PipelineError,
};
use crate::render::{DisplayTarget, EngineError, NodeHandle, RenderOptions, RenderSynchronizer, Rendition, ThemeMode};

use super::events::{EditorAction, Effect, Notification, ReaderEvent, ReaderOptions};

pub struct ReaderSession<R: Rendition> {
    book_id: String,
    synchronizer: RenderSynchronizer<R>,
    store: AnnotationStore,
    editor: Editor,
    listener: SelectionListener,
    pipeline: MutationPipeline,
    notifications: Vec<Notification>,
    location: Option<Cfi>,
    torn_down: bool,
}

impl<R: Rendition> ReaderSession<R> {
    /// Render the book into its container and open it at the saved position.
    ///
    /// `marks` is the book's mark list; highlights are painted once the
    /// engine reports [`ReaderEvent::Displayed`].
    pub fn mount(mut engine: R, options: &ReaderOptions, marks: Vec<Mark>) -> Result<Self, EngineError> {
        engine.render(&options.container_id, &options.source_url, &RenderOptions::default())?;
        engine.display(&DisplayTarget::from_saved(&options.current))?;

        let mut synchronizer = RenderSynchronizer::new(engine);
        synchronizer.register_themes();
        synchronizer.apply_theme(ThemeMode::default());

        let mut store = AnnotationStore::new(&options.book_id);
        store.replace_all(marks);

        tracing::info!(
            "Mounted reader for book {} with {} marks",
            options.book_id,
            store.len()
        );

        Ok(Self {
            book_id: options.book_id.clone(),
            synchronizer,
            store,
            editor: Editor::new(&options.book_id),
            listener: SelectionListener::new(),
            pipeline: MutationPipeline::new(),
            notifications: Vec::new(),
            location: Cfi::new(options.current.as_str()).ok(),
            torn_down: false,
        })
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn synchronizer(&self) -> &RenderSynchronizer<R> {
        &self.synchronizer
    }

    pub fn listener(&self) -> &SelectionListener {
        &self.listener
    }

    /// Last location reported by the engine
    pub fn location(&self) -> Option<&Cfi> {
        self.location.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Requests issued but not yet completed
    pub fn pending(&self) -> usize {
        self.pipeline.pending()
    }

    /// Whether the popup's submit control is disabled
    pub fn is_submitting(&self) -> bool {
        self.editor_key()
            .map_or(false, |key| self.pipeline.is_busy(&key))
    }

    /// Highlights in reading order, for the drawer
    pub fn highlights(&self) -> Vec<&Mark> {
        self.store.highlights()
    }

    /// Bookmarks in reading order, for the drawer
    pub fn bookmarks(&self) -> Vec<&Mark> {
        self.store.bookmarks()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn editor_key(&self) -> Option<MarkKey> {
        match self.editor.state() {
            EditorState::Closed => None,
            EditorState::Creating(draft) => Some(MarkKey::Draft(draft.key)),
            EditorState::Editing(session) => Some(MarkKey::Persisted(session.id.clone())),
        }
    }

    /// Handle an engine event
    pub fn handle(&mut self, event: ReaderEvent) -> Vec<Effect> {
        if self.torn_down {
            tracing::debug!("Ignoring {:?}: session torn down", event);
            return Vec::new();
        }

        match event {
            ReaderEvent::Displayed => {
                if self.synchronizer.initial_paint_done() {
                    self.synchronizer.retry_pending();
                } else {
                    self.synchronizer.paint_initial(self.store.highlights());
                }
                Vec::new()
            }
            ReaderEvent::Selected(raw) => {
                self.select(raw);
                Vec::new()
            }
            ReaderEvent::SelectionChanged => {
                if self.listener.fire() {
                    tracing::debug!("Selection changed, closing editor");
                    self.close_editor();
                }
                Vec::new()
            }
            ReaderEvent::MarkClicked { epubcfi, node } => {
                self.open_clicked(&epubcfi, node);
                Vec::new()
            }
            ReaderEvent::Relocated { cfi, href } => match Cfi::new(cfi) {
                Ok(cfi) => {
                    tracing::debug!("Relocated to {} ({})", cfi, href);
                    self.location = Some(cfi.clone());
                    if self.synchronizer.initial_paint_done() {
                        self.synchronizer.retry_pending();
                    }
                    vec![Effect::SavePosition {
                        book_id: self.book_id.clone(),
                        cfi,
                    }]
                }
                Err(e) => {
                    tracing::debug!("Ignoring relocation to {}: {}", href, e);
                    Vec::new()
                }
            },
        }
    }

    fn select(&mut self, raw: RawSelection) {
        let selection = match cfi::selection_from(raw) {
            Ok(selection) => selection,
            Err(e) => {
                tracing::warn!("Ignoring selection: {}", e);
                return;
            }
        };

        // Whatever is open goes away before the new draft exists
        self.close_editor();
        self.listener.arm();
        self.editor.open_draft(&selection);
    }

    fn open_clicked(&mut self, epubcfi: &Cfi, node: NodeHandle) {
        let payload = self
            .synchronizer
            .mark_for_node(node)
            .or_else(|| self.synchronizer.painted_mark(epubcfi))
            .cloned();

        let listed = payload
            .as_ref()
            .and_then(|m| self.store.get(&m.id))
            .or_else(|| self.store.find_by_cfi(epubcfi))
            .cloned();

        let Some(mark) = listed.or(payload) else {
            tracing::warn!("Clicked highlight at {} is not a known mark", epubcfi);
            return;
        };

        let anchor = self
            .synchronizer
            .anchor_for(mark.epubcfi())
            .unwrap_or(node);

        self.close_editor();
        self.listener.arm();
        self.editor.open_existing(mark, Anchor::Node(anchor));
    }

    /// Close the editor, restoring the overlay of an abandoned edit
    fn close_editor(&mut self) {
        self.listener.disarm();
        match self.editor.close() {
            EditorState::Editing(session) => {
                self.synchronizer.repaint(&session.snapshot);
            }
            EditorState::Creating(draft) => {
                tracing::debug!("Discarded {} at {}", draft.key, draft.fields.epubcfi);
            }
            EditorState::Closed => {}
        }
    }

    /// Handle a user action in the editor popup
    pub fn act(&mut self, action: EditorAction) -> Vec<Effect> {
        if self.torn_down {
            tracing::debug!("Ignoring {:?}: session torn down", action);
            return Vec::new();
        }

        match action {
            EditorAction::SetColor(color) => self.edit(FieldEdit::Color(color)),
            EditorAction::SetContent(content) => self.edit(FieldEdit::Content(content)),
            EditorAction::Confirm => self.confirm(),
            EditorAction::Delete => self.delete_open(),
            EditorAction::Cancel => {
                self.cancel();
                Vec::new()
            }
        }
    }

    fn edit(&mut self, edit: FieldEdit) -> Vec<Effect> {
        let key = match self.editor.apply(edit) {
            None => {
                tracing::debug!("Ignoring edit: editor closed");
                return Vec::new();
            }
            Some(EditTarget::Existing(_)) => return Vec::new(),
            Some(EditTarget::Draft(key)) => key,
        };

        // The first edit of a draft persists it; edits made while that
        // create is outstanding ride along with the promotion
        if self.pipeline.is_busy(&MarkKey::Draft(key)) {
            tracing::debug!("Create already in flight for {}", key);
            return Vec::new();
        }
        let Some(value) = self.editor.value() else {
            return Vec::new();
        };
        let request = self.pipeline.begin_create(key, value.fields);
        self.issue(request)
    }

    fn confirm(&mut self) -> Vec<Effect> {
        let Some(value) = self.editor.value() else {
            return Vec::new();
        };
        let request = self.pipeline.begin_update(&value);
        if let Ok(request) = &request {
            self.editor.mark_confirming(request.ticket);
        }
        self.issue(request)
    }

    fn delete_open(&mut self) -> Vec<Effect> {
        let Some(value) = self.editor.value() else {
            return Vec::new();
        };
        let request = self
            .pipeline
            .begin_delete(value.id.as_ref(), &self.book_id, &value.fields.epubcfi);
        self.issue(request)
    }

    fn cancel(&mut self) {
        if let Some(id) = self.editor.editing_id() {
            let key = MarkKey::Persisted(id.clone());
            if self.pipeline.in_flight(&key) == Some(MutationKind::Delete) {
                tracing::warn!("Refusing to cancel while deleting {}", key);
                return;
            }
        }
        self.close_editor();
    }

    fn issue(&mut self, request: Result<MutationRequest, PipelineError>) -> Vec<Effect> {
        match request {
            Ok(request) => vec![Effect::Mutate(request)],
            Err(e @ PipelineError::MissingIdentifier(_)) => {
                tracing::warn!("Refusing request: {}", e);
                Vec::new()
            }
            Err(e @ PipelineError::InFlight { .. }) => {
                tracing::debug!("Request not issued: {}", e);
                Vec::new()
            }
        }
    }

    /// Page forward
    pub fn next_page(&mut self) {
        self.navigate(|engine| engine.next());
    }

    pub fn prev_page(&mut self) {
        self.navigate(|engine| engine.prev());
    }

    /// Jump to a CFI, typically from a drawer entry
    pub fn go_to(&mut self, cfi: &Cfi) {
        let target = DisplayTarget::Cfi(cfi.clone());
        self.navigate(|engine| engine.display(&target));
    }

    fn navigate(&mut self, turn: impl FnOnce(&mut R) -> Result<(), EngineError>) {
        if self.torn_down {
            return;
        }
        self.close_editor();
        if let Some(engine) = self.synchronizer.engine_mut() {
            if let Err(e) = turn(engine) {
                tracing::warn!("Navigation failed: {}", e);
            }
        }
    }

    pub fn set_theme(&mut self, mode: ThemeMode) {
        self.synchronizer.apply_theme(mode);
    }

    /// Bookmark the current location
    pub fn add_bookmark(&mut self, title: &str) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let Some(cfi) = self.location.clone() else {
            tracing::warn!("No location to bookmark yet");
            return Vec::new();
        };
        if let Some(existing) = self.store.find_by_cfi(&cfi) {
            tracing::debug!("Location {} already carries mark {}", cfi, existing.id);
            return Vec::new();
        }

        let key = self.editor.next_key();
        let fields = MarkFields::bookmark(&self.book_id, cfi, title);
        let request = self.pipeline.begin_create(key, fields);
        self.issue(request)
    }

    /// Delete a listed mark by identifier
    pub fn remove_mark(&mut self, id: &MarkId) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let Some(mark) = self.store.get(id) else {
            tracing::warn!("Mark {} not found in book {}", id, self.book_id);
            return Vec::new();
        };
        let request = self
            .pipeline
            .begin_delete(Some(&mark.id), &self.book_id, mark.epubcfi());
        self.issue(request)
    }

    /// Reconcile a finished request
    pub fn complete(&mut self, outcome: MutationOutcome) -> Vec<Effect> {
        if !self.pipeline.finish(&outcome.request) {
            tracing::debug!("Dropping stale outcome {:?}", outcome.request.ticket);
            return Vec::new();
        }
        if self.torn_down {
            tracing::debug!(
                "Dropping {} outcome after teardown",
                outcome.request.mutation.kind().as_str()
            );
            return Vec::new();
        }

        let MutationOutcome { request, result } = outcome;
        match (&request.mutation, result) {
            (_, Err(e)) => {
                self.report_failure(request.mutation.kind(), &e);
                Vec::new()
            }
            (Mutation::Create { key, .. }, Ok(MutationResponse::Created(id))) => {
                let Some(mark) = created_mark(&request, &id) else {
                    return Vec::new();
                };
                self.store.upsert(mark.clone());
                self.synchronizer.paint(&mark);
                if self.editor.promote(*key, &mark).is_none() {
                    tracing::debug!("{} saved as {} after the editor moved on", key, id);
                }
                vec![Effect::Refetch]
            }
            (Mutation::Create { key, .. }, Ok(MutationResponse::Acknowledged)) => {
                tracing::warn!("Create of {} returned no identifier", key);
                self.notifications.push(Notification::error("Failed to save mark"));
                Vec::new()
            }
            (Mutation::Update { mark }, Ok(_)) => {
                self.store.upsert(mark.clone());
                self.synchronizer.paint(mark);
                // A reopened edit of the same mark stays open
                if self.editor.confirming() == Some(request.ticket) {
                    self.listener.disarm();
                    self.editor.close();
                }
                vec![Effect::Refetch]
            }
            (Mutation::Delete { id, epubcfi, .. }, Ok(_)) => {
                self.store.remove(id);
                self.synchronizer.remove(epubcfi);
                if self.editor.editing_id() == Some(id) {
                    self.listener.disarm();
                    self.editor.close();
                }
                vec![Effect::Refetch]
            }
        }
    }

    fn report_failure(&mut self, kind: MutationKind, error: &ApiError) {
        let message = match error {
            ApiError::Unauthenticated => "Sign in to save your marks".to_string(),
            _ => {
                let verb = match kind {
                    MutationKind::Create => "save",
                    MutationKind::Update => "update",
                    MutationKind::Delete => "delete",
                };
                format!("Failed to {} mark: {}", verb, error)
            }
        };
        self.notifications.push(Notification::error(message));
    }

    /// Replace the store with a refetched list and bring overlays in line
    pub fn apply_refetch(&mut self, marks: Vec<Mark>) {
        if self.torn_down {
            return;
        }
        self.store.replace_all(marks);
        if !self.synchronizer.initial_paint_done() {
            return;
        }

        let mut tracked = self.synchronizer.painted_cfis();
        tracked.extend(self.synchronizer.pending_cfis());
        for cfi in tracked {
            let listed = self
                .store
                .find_by_cfi(&cfi)
                .map_or(false, |m| m.mark_type() == MarkType::Highlight);
            if !listed {
                self.synchronizer.remove(&cfi);
            }
        }

        let highlights: Vec<Mark> = self.store.highlights().into_iter().cloned().collect();
        for mark in &highlights {
            if self.synchronizer.painted_mark(mark.epubcfi()) != Some(mark) {
                self.synchronizer.paint(mark);
            }
        }
    }

    /// Destroy the engine and close the editor.
    ///
    /// Outstanding requests are not cancelled; their outcomes become no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.listener.disarm();
        self.editor.close();
        self.synchronizer.detach();
        self.torn_down = true;
        tracing::info!(
            "Reader for book {} torn down with {} requests outstanding",
            self.book_id,
            self.pipeline.pending()
        );
    }
}
