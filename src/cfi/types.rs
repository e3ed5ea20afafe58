//! CFI value types used by the reader
//!
//! The reader treats a CFI as an opaque, comparable string produced and
//! consumed by the rendering engine. The only structural requirement here is
//! that a CFI is never empty.
//!
//! Reference: <https://idpf.org/epub/linking/cfi/epub-cfi.html>

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A non-empty EPUB CFI string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cfi(String);

/// Errors produced while building CFI values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfiError {
    #[error("CFI must not be empty")]
    Empty,
}

impl Cfi {
    /// Wrap a CFI string, rejecting empty input
    pub fn new(value: impl Into<String>) -> Result<Self, CfiError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CfiError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Cfi {
    type Error = CfiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cfi::new(value)
    }
}

impl TryFrom<&str> for Cfi {
    type Error = CfiError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Cfi::new(value)
    }
}

impl From<Cfi> for String {
    fn from(cfi: Cfi) -> Self {
        cfi.0
    }
}

impl AsRef<str> for Cfi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Screen rectangle of a selection, in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
