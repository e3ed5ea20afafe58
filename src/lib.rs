//! Inkmark
//!
//! Annotation subsystem of an EPUB reader, plus the mark service it talks to.
//!
//! # Modules
//!
//! - `cfi`: CFI values, reading order and the selection adapter
//! - `annotations`: mark model and the per-book store
//! - `render`: rendering engine boundary and the overlay synchronizer
//! - `editor`: highlight editor state machine
//! - `pipeline`: optimistic create/update/delete requests
//! - `session`: per-book reader session and its effect driver
//! - `api`: remote mark API client
//! - `config`, `db`, `error`, `routes`, `state`: the mark service

pub mod annotations;
pub mod api;
pub mod cfi;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;
