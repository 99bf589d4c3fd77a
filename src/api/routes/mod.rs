//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`accounts`] - Monitored account management
//! - [`logs`] - Audit trail
//! - [`archive`] - Archived items
//! - [`scheduler`] - Run/pause, manual checks, check interval
//! - [`system`] - Health, stats, events, OpenAPI

use crate::types::AccountStatus;
use serde::{Deserialize, Serialize};

mod accounts;
mod archive;
mod logs;
mod scheduler;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use accounts::*;
pub use archive::*;
pub use logs::*;
pub use scheduler::*;
pub use system::*;

/// Number of log entries returned when `limit` is not given
pub const DEFAULT_LOG_LIMIT: usize = 100;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /accounts
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddAccountRequest {
    /// Handle to monitor; a leading `@` is accepted and stripped
    pub handle: String,
}

/// Request body for PUT /accounts/:id/status
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SetStatusRequest {
    /// New status (`active`, `paused` or `error`)
    pub status: AccountStatus,
}

/// Query parameters for GET /logs
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LogsQuery {
    /// Maximum number of entries to return (default: 100)
    pub limit: Option<usize>,
}

/// Request body for PUT /scheduler/interval
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SetIntervalRequest {
    /// Seconds between automatic cycles (600..=7200)
    pub interval_seconds: u64,
}

/// Response for POST /scheduler/start and /scheduler/stop
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModeChangeResponse {
    /// Whether the call changed the mode (false if it already was in that mode)
    pub changed: bool,
    /// Scheduler state after the call
    pub status: crate::types::SchedulerStatus,
}
