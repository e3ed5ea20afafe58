//! JSON bodies of the mark API
//!
//! Shared by [`HttpMarkApi`](super::HttpMarkApi) and the server routes so
//! both ends agree on the wire format.

use serde::{Deserialize, Serialize};

use crate::annotations::{MarkFields, MarkId, MarkType};

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `GET /api/mark` query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<MarkType>,
}

/// `POST /api/mark/update` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMarkParams {
    pub id: MarkId,
    #[serde(flatten)]
    pub fields: MarkFields,
}

/// `POST /api/mark/destroy` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyMarkParams {
    pub id: MarkId,
    pub book_id: String,
}

/// `POST /api/book/:id/update` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCurrentParams {
    pub current: String,
}
