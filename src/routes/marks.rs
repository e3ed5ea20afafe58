//! Mark API routes
//!
//! Every response wraps its payload in `{ "data": ... }`. Mutations answer
//! with the affected mark's identifier.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::annotations::{Mark, MarkFields, MarkId};
use crate::api::{ApiResponse, DestroyMarkParams, MarkQuery, UpdateMarkParams};
use crate::db::MarkRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::{AppJson, AppQuery};

/// Create the marks router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_marks))
        .route("/create", post(create_mark))
        .route("/update", post(update_mark))
        .route("/destroy", post(destroy_mark))
}

fn require_book(book_id: &str) -> Result<()> {
    if book_id.trim().is_empty() {
        return Err(AppError::BadRequest("bookId is required".to_string()));
    }
    Ok(())
}

/// List marks, optionally by book and type
async fn list_marks(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MarkQuery>,
) -> Result<Json<ApiResponse<Vec<Mark>>>> {
    let repo = MarkRepository::new(state.db());
    let marks = repo.list(query.book_id.as_deref(), query.mark_type).await?;
    Ok(Json(ApiResponse::new(marks)))
}

/// Create a mark
async fn create_mark(
    State(state): State<AppState>,
    AppJson(fields): AppJson<MarkFields>,
) -> Result<Json<ApiResponse<MarkId>>> {
    require_book(&fields.book_id)?;
    let repo = MarkRepository::new(state.db());
    let mark = repo.create(&fields).await?;
    Ok(Json(ApiResponse::new(mark.id)))
}

/// Replace a mark's fields
async fn update_mark(
    State(state): State<AppState>,
    AppJson(params): AppJson<UpdateMarkParams>,
) -> Result<Json<ApiResponse<MarkId>>> {
    require_book(&params.fields.book_id)?;
    let repo = MarkRepository::new(state.db());
    let mark = repo
        .update(params.id.as_str(), &params.fields.book_id, &params.fields)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Update of missing mark {}", params.id);
            AppError::NotFound(format!("Mark not found: {}", params.id))
        })?;
    Ok(Json(ApiResponse::new(mark.id)))
}

/// Delete a mark
async fn destroy_mark(
    State(state): State<AppState>,
    AppJson(params): AppJson<DestroyMarkParams>,
) -> Result<Json<ApiResponse<MarkId>>> {
    let repo = MarkRepository::new(state.db());
    if !repo.delete(params.id.as_str(), &params.book_id).await? {
        tracing::warn!("Delete of missing mark {} in book {}", params.id, params.book_id);
        return Err(AppError::NotFound(format!("Mark not found: {}", params.id)));
    }
    Ok(Json(ApiResponse::new(params.id)))
}
