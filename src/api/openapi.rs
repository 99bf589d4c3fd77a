//! OpenAPI documentation and schema generation
//!
//! The OpenAPI document is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the social-archiver REST API
///
/// Served at:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "social-archiver REST API",
        version = "0.1.0",
        description = "Control and observe an unattended social-media monitoring and archival engine",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790/api/v1", description = "Local development server")
    ),
    paths(
        // Accounts
        crate::api::routes::list_accounts,
        crate::api::routes::add_account,
        crate::api::routes::get_account,
        crate::api::routes::remove_account,
        crate::api::routes::set_account_status,

        // Logs
        crate::api::routes::list_logs,

        // Archive
        crate::api::routes::list_archive,

        // Scheduler
        crate::api::routes::get_scheduler,
        crate::api::routes::start_scheduler,
        crate::api::routes::stop_scheduler,
        crate::api::routes::trigger_check,
        crate::api::routes::set_interval,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_stats,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::AccountId,
        crate::types::AccountStatus,
        crate::types::Account,
        crate::types::LogAction,
        crate::types::Severity,
        crate::types::LogEntry,
        crate::types::MediaKind,
        crate::types::StorageRef,
        crate::types::ArchivedItem,
        crate::types::SchedulerMode,
        crate::types::SchedulerStatus,
        crate::types::Stats,
        crate::types::CycleReport,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::AddAccountRequest,
        crate::api::routes::SetStatusRequest,
        crate::api::routes::LogsQuery,
        crate::api::routes::SetIntervalRequest,
        crate::api::routes::ModeChangeResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "accounts", description = "Monitored accounts - Add, remove, pause and re-enable"),
        (name = "logs", description = "Audit trail - Bounded log of every check, download and upload"),
        (name = "archive", description = "Archive - Items downloaded and stored so far"),
        (name = "scheduler", description = "Scheduler - Run/pause, manual checks and check interval"),
        (name = "system", description = "System endpoints - Health, stats, OpenAPI spec, events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `X-Api-Key` security scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
