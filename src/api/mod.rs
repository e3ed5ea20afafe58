//! Remote mark API: client trait, HTTP implementation and wire types

mod client;
mod error;
mod types;

pub use client::{HttpMarkApi, MarkApi};
pub use error::ApiError;
pub use types::{ApiResponse, DestroyMarkParams, ErrorBody, MarkQuery, UpdateCurrentParams, UpdateMarkParams};
