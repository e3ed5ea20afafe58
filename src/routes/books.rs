//! Last-read position routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::{ApiResponse, UpdateCurrentParams};
use crate::db::BookRepository;
use crate::error::Result;
use crate::state::AppState;

use super::AppJson;

/// Create the books router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_current))
        .route("/:id/update", post(update_current))
}

/// Saved position of a book, empty when none was saved
async fn get_current(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>> {
    let current = BookRepository::new(state.db()).current(&id).await?;
    Ok(Json(ApiResponse::new(current)))
}

async fn update_current(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(params): AppJson<UpdateCurrentParams>,
) -> Result<Json<ApiResponse<String>>> {
    let current = BookRepository::new(state.db())
        .set_current(&id, &params.current)
        .await?;
    Ok(Json(ApiResponse::new(current)))
}
