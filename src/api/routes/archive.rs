//! Archived item handler.

use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};

/// GET /archive - Everything archived so far, newest first
#[utoipa::path(
    get,
    path = "/api/v1/archive",
    tag = "archive",
    responses(
        (status = 200, description = "Archived items, newest first", body = Vec<crate::types::ArchivedItem>)
    )
)]
pub async fn list_archive(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.archiver.list_archived_items().await)
}
