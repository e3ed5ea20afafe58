//! CFI (Canonical Fragment Identifier) addressing for EPUB
//!
//! The rendering engine owns CFI generation and resolution. This module wraps
//! what the reader needs around it: a validated CFI value, reading-order
//! comparison, and the adapter that turns an engine selection into a
//! [`Selection`] with its context heading.
//!
//! # Example CFI
//!
//! ```text
//! epubcfi(/6/4[chapter1]!/4/2/1:42)
//!         │  │          │ │ │ │ └── character offset 42
//!         │  │          │ │ │ └──── text node (odd = text)
//!         │  │          │ │ └────── element index
//!         │  │          │ └──────── element index (body)
//!         │  │          └────────── indirection (into content doc)
//!         │  └───────────────────── spine item with ID
//!         └──────────────────────── spine element
//! ```

mod adapter;
mod comparator;
mod types;

pub use adapter::{context_heading, selection_from, ElementInfo, RawSelection, Selection};
pub use comparator::{compare, compare_cfi_strings, is_before};
pub use types::{Cfi, CfiError, Rect};
