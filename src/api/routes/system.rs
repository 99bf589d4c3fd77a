//! System handlers: health, stats, OpenAPI, events.

use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /stats - Dashboard overview
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "system",
    responses(
        (status = 200, description = "Account, archive and countdown counters", body = crate::types::Stats)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.archiver.stats().await)
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// SSE event name for an engine event (matches the JSON `type` tag)
pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Log { .. } => "log",
        Event::Archived { .. } => "archived",
        Event::AccountAdded { .. } => "account_added",
        Event::AccountRemoved { .. } => "account_removed",
        Event::AccountStatusChanged { .. } => "account_status_changed",
        Event::SchedulerStarted => "scheduler_started",
        Event::SchedulerStopped => "scheduler_stopped",
        Event::IntervalChanged { .. } => "interval_changed",
        Event::CycleStarted { .. } => "cycle_started",
        Event::CycleCompleted { .. } => "cycle_completed",
        Event::CycleSkipped => "cycle_skipped",
        Event::Shutdown => "shutdown",
    }
}

/// GET /events - Server-sent events stream
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = BroadcastStream::new(state.archiver.subscribe());

    let sse_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Ok(SseEvent::default().event(event_name(&event)).data(data))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize event to JSON");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE client lagged");
            Some(Ok(SseEvent::default()
                .event("error")
                .data(json!({"error": "lagged", "skipped": skipped}).to_string())))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
