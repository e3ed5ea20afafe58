//! In-memory mark store for one open book
//!
//! Mirrors the remote mark list: the remote copy is authoritative and
//! `replace_all` is called with every refetch. Between refetches the reader
//! upserts confirmed marks so listings stay current.

use std::collections::HashMap;

use crate::cfi::{self, Cfi};

use super::types::{Mark, MarkId, MarkType};

/// Marks of a single book keyed by CFI, with an identifier index
#[derive(Debug, Default)]
pub struct AnnotationStore {
    book_id: String,
    by_cfi: HashMap<Cfi, Mark>,
    ids: HashMap<MarkId, Cfi>,
}

impl AnnotationStore {
    pub fn new(book_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            ..Default::default()
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// Replace the contents with a freshly fetched list
    pub fn replace_all(&mut self, marks: impl IntoIterator<Item = Mark>) {
        self.by_cfi.clear();
        self.ids.clear();
        for mark in marks {
            self.upsert(mark);
        }
    }

    /// Insert or replace a mark.
    ///
    /// A CFI held by a different identifier is evicted: the rendering layer
    /// keys visual marks by CFI and cannot show both.
    pub fn upsert(&mut self, mark: Mark) -> Option<Mark> {
        if mark.fields.book_id != self.book_id {
            tracing::warn!(
                "Ignoring mark {} for book {} in store of book {}",
                mark.id,
                mark.fields.book_id,
                self.book_id
            );
            return None;
        }

        // The same id may have moved to a new CFI
        if let Some(old_cfi) = self.ids.get(&mark.id).cloned() {
            if &old_cfi != mark.epubcfi() {
                self.by_cfi.remove(&old_cfi);
            }
        }

        let cfi = mark.epubcfi().clone();
        let previous = self.by_cfi.insert(cfi.clone(), mark.clone());
        if let Some(prev) = &previous {
            if prev.id != mark.id {
                tracing::warn!(
                    "Mark {} replaces mark {} at {}",
                    mark.id,
                    prev.id,
                    cfi
                );
                self.ids.remove(&prev.id);
            }
        }
        self.ids.insert(mark.id, cfi);
        previous
    }

    /// Remove a mark by identifier
    pub fn remove(&mut self, id: &MarkId) -> Option<Mark> {
        let cfi = self.ids.remove(id)?;
        self.by_cfi.remove(&cfi)
    }

    pub fn get(&self, id: &MarkId) -> Option<&Mark> {
        self.ids.get(id).and_then(|cfi| self.by_cfi.get(cfi))
    }

    pub fn find_by_cfi(&self, cfi: &Cfi) -> Option<&Mark> {
        self.by_cfi.get(cfi)
    }

    pub fn len(&self) -> usize {
        self.by_cfi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cfi.is_empty()
    }

    /// Marks of one kind in reading order
    pub fn of_type(&self, mark_type: MarkType) -> Vec<&Mark> {
        let mut marks: Vec<&Mark> = self
            .by_cfi
            .values()
            .filter(|m| m.mark_type() == mark_type)
            .collect();
        marks.sort_by(|a, b| cfi::compare(a.epubcfi(), b.epubcfi()));
        marks
    }

    /// Highlight list projection
    pub fn highlights(&self) -> Vec<&Mark> {
        self.of_type(MarkType::Highlight)
    }

    /// Bookmark list projection
    pub fn bookmarks(&self) -> Vec<&Mark> {
        self.of_type(MarkType::Bookmark)
    }
}
