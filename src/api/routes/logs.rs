//! Audit trail handler.

use super::{DEFAULT_LOG_LIMIT, LogsQuery};
use crate::api::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

/// GET /logs - Most recent log entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "logs",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of entries (default 100)")
    ),
    responses(
        (status = 200, description = "Log entries, newest first", body = Vec<crate::types::LogEntry>),
        (status = 400, description = "Invalid query parameters")
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Json(state.archiver.list_recent_logs(limit).await)
}
