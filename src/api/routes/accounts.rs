//! Monitored account handlers.

use super::{AddAccountRequest, SetStatusRequest};
use crate::api::AppState;
use crate::error::Error;
use crate::types::AccountId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// GET /accounts - List monitored accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Monitored accounts in insertion order", body = Vec<crate::types::Account>)
    )
)]
pub async fn list_accounts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.archiver.list_accounts().await)
}

/// POST /accounts - Start monitoring a handle
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body(content = AddAccountRequest, description = "Handle to monitor"),
    responses(
        (status = 201, description = "Account added", body = crate::types::Account),
        (status = 400, description = "Handle is empty after normalization", body = ApiError),
        (status = 503, description = "Shutting down", body = ApiError)
    )
)]
pub async fn add_account(
    State(state): State<AppState>,
    Json(request): Json<AddAccountRequest>,
) -> Result<impl IntoResponse, Error> {
    let account = state.archiver.add_account(&request.handle).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts/:id - Get a single account
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(("id" = u64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "The account", body = crate::types::Account),
        (status = 404, description = "Account not found", body = ApiError)
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<impl IntoResponse, Error> {
    state
        .archiver
        .get_account(id)
        .await
        .map(Json)
        .ok_or(Error::AccountNotFound(id))
}

/// DELETE /accounts/:id - Stop monitoring an account
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(("id" = u64, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 404, description = "Account not found", body = ApiError)
    )
)]
pub async fn remove_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<StatusCode, Error> {
    if state.archiver.remove_account(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::AccountNotFound(id))
    }
}

/// PUT /accounts/:id/status - Pause, resume or re-enable an account
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}/status",
    tag = "accounts",
    params(("id" = u64, Path, description = "Account ID")),
    request_body(content = SetStatusRequest, description = "New status"),
    responses(
        (status = 200, description = "Updated account", body = crate::types::Account),
        (status = 404, description = "Account not found", body = ApiError)
    )
)]
pub async fn set_account_status(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, Error> {
    let account = state.archiver.set_account_status(id, request.status).await?;
    Ok(Json(account))
}
