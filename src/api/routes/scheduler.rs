//! Scheduler control handlers.

use super::{ModeChangeResponse, SetIntervalRequest};
use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::scheduler::CycleDispatch;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// GET /scheduler - Run mode, interval and countdown
#[utoipa::path(
    get,
    path = "/api/v1/scheduler",
    tag = "scheduler",
    responses(
        (status = 200, description = "Scheduler state", body = crate::types::SchedulerStatus)
    )
)]
pub async fn get_scheduler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.archiver.scheduler_status().await)
}

/// POST /scheduler/start - Switch automatic monitoring on
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/start",
    tag = "scheduler",
    responses(
        (status = 200, description = "Monitoring is running", body = ModeChangeResponse)
    )
)]
pub async fn start_scheduler(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.archiver.start().await;
    Json(ModeChangeResponse {
        changed,
        status: state.archiver.scheduler_status().await,
    })
}

/// POST /scheduler/stop - Switch automatic monitoring off
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/stop",
    tag = "scheduler",
    responses(
        (status = 200, description = "Monitoring is paused", body = ModeChangeResponse)
    )
)]
pub async fn stop_scheduler(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.archiver.stop().await;
    Json(ModeChangeResponse {
        changed,
        status: state.archiver.scheduler_status().await,
    })
}

/// POST /scheduler/check - Check every active account now
///
/// Answers once the cycle has finished.
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/check",
    tag = "scheduler",
    responses(
        (status = 200, description = "Cycle finished", body = crate::types::CycleReport),
        (status = 409, description = "Another cycle is still running", body = ApiError),
        (status = 503, description = "Shutting down", body = ApiError)
    )
)]
pub async fn trigger_check(State(state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let response = match state.archiver.trigger_manual_check().await? {
        CycleDispatch::Completed(report) => (StatusCode::OK, Json(report)).into_response(),
        CycleDispatch::Skipped => (
            StatusCode::CONFLICT,
            Json(ApiError::new(
                "cycle_running",
                "Previous check still running. Skipping this cycle.",
            )),
        )
            .into_response(),
    };
    Ok(response)
}

/// PUT /scheduler/interval - Change the interval between automatic cycles
#[utoipa::path(
    put,
    path = "/api/v1/scheduler/interval",
    tag = "scheduler",
    request_body(content = SetIntervalRequest, description = "New interval in seconds"),
    responses(
        (status = 200, description = "Interval changed", body = crate::types::SchedulerStatus),
        (status = 400, description = "Interval outside 600..=7200 seconds", body = ApiError)
    )
)]
pub async fn set_interval(
    State(state): State<AppState>,
    Json(request): Json<SetIntervalRequest>,
) -> Result<impl IntoResponse, Error> {
    state
        .archiver
        .set_check_interval(request.interval_seconds)
        .await?;
    Ok(Json(state.archiver.scheduler_status().await))
}
