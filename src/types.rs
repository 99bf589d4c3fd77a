//! Core types for social-archiver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subject used for log entries that are not about a single account
pub const SYSTEM_SUBJECT: &str = "System";

/// Unique identifier for a monitored account
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    /// Create a new AccountId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<AccountId> for u64 {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Monitoring status of an account
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Checked on every cycle
    #[default]
    Active,
    /// Skipped by the scheduler
    Paused,
    /// Parked after a failure that needs a human (e.g. login wall)
    Error,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountStatus::Active => "active",
            AccountStatus::Paused => "paused",
            AccountStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A monitored social-media account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Registry-assigned identifier
    pub id: AccountId,

    /// Normalized handle (no `@`, trimmed)
    pub handle: String,

    /// Current monitoring status
    pub status: AccountStatus,

    /// When the last check attempt finished (None = never checked)
    pub last_checked_at: Option<DateTime<Utc>>,

    /// Message of the most recent failed check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// When the account was added
    pub added_at: DateTime<Utc>,
}

impl Account {
    /// Whether the scheduler should check this account
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// What a log entry records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    /// A check (or a batch of checks) began
    CheckStarted,
    /// A check (or a batch of checks) finished
    CheckCompleted,
    /// The source reported a new media item
    ItemFound,
    /// Media bytes were downloaded
    Downloaded,
    /// Media was stored in the archive
    Uploaded,
    /// Work was deliberately not done (duplicate item, overlapping cycle)
    Skipped,
    /// Something went wrong
    Failed,
    /// An account was added to the monitoring list
    AccountAdded,
    /// An account was removed from the monitoring list
    AccountRemoved,
}

/// Severity of a log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Positive outcome
    Success,
    /// Failure
    Failure,
}

/// One entry of the audit trail
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    /// Monotonic entry number (never reused, survives eviction)
    pub id: u64,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,

    /// Account handle, or [`SYSTEM_SUBJECT`]
    pub subject: String,

    /// What happened
    pub action: LogAction,

    /// Free text
    pub message: String,

    /// Severity
    pub severity: Severity,
}

impl LogEntry {
    /// Whether the entry is about the engine rather than an account
    pub fn is_system(&self) -> bool {
        self.subject == SYSTEM_SUBJECT
    }
}

/// Kind of media published by an account
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Regular feed post
    #[default]
    Post,
    /// Ephemeral story
    Story,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Post => f.write_str("post"),
            MediaKind::Story => f.write_str("story"),
        }
    }
}

/// Stable reference returned by an archive sink
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct StorageRef(pub String);

impl StorageRef {
    /// Borrow the reference as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successfully downloaded-and-stored media unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArchivedItem {
    /// Index-assigned identifier
    pub id: u64,

    /// Handle of the account the media came from
    pub source_handle: String,

    /// Post or story
    pub media_kind: MediaKind,

    /// Source-side media reference (used for de-duplication)
    pub media_ref: String,

    /// Where the sink stored it
    pub storage_ref: StorageRef,

    /// Caption, if the source supplied one
    pub caption: Option<String>,

    /// When the item was archived
    pub archived_at: DateTime<Utc>,
}

/// Scheduler run mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerMode {
    /// Automatic cycles are scheduled
    Running,
    /// Only manual checks run
    #[default]
    Paused,
}

/// Point-in-time view of the scheduler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchedulerStatus {
    /// Run mode
    pub mode: SchedulerMode,

    /// Configured interval between automatic cycles
    pub interval_seconds: u64,

    /// Seconds until the next automatic cycle
    pub remaining_seconds: u64,

    /// Whether a cycle is executing right now
    pub cycle_running: bool,

    /// Cycles that ran to completion
    pub cycles_completed: u64,

    /// Cycles skipped because another was still running
    pub cycles_skipped: u64,

    /// Start of the most recent cycle
    pub last_cycle_started_at: Option<DateTime<Utc>>,

    /// End of the most recent cycle
    pub last_cycle_finished_at: Option<DateTime<Utc>>,
}

/// Dashboard overview counters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    /// Accounts in the active state
    pub active_accounts: usize,

    /// All monitored accounts
    pub total_accounts: usize,

    /// Items in the archive index
    pub archived_items: usize,

    /// Seconds until the next automatic check
    pub next_check_in_seconds: u64,

    /// Whether automatic monitoring is on
    pub running: bool,
}

/// Summary of one full pass over the active accounts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CycleReport {
    /// When the cycle began
    pub started_at: Option<DateTime<Utc>>,

    /// When the cycle ended
    pub finished_at: Option<DateTime<Utc>>,

    /// Accounts whose check ran
    pub accounts_checked: usize,

    /// Accounts whose check failed at the source or aborted
    pub accounts_errored: usize,

    /// Items reported by the source
    pub items_found: usize,

    /// Items stored in the archive
    pub items_archived: usize,

    /// Items that failed to download or upload
    pub items_failed: usize,

    /// Items skipped as already archived
    pub items_skipped: usize,

    /// Whether shutdown interrupted the cycle
    pub cancelled: bool,
}

/// Event emitted by the engine
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A log entry was appended
    Log {
        /// The new entry
        entry: LogEntry,
    },

    /// An item was archived
    Archived {
        /// The new archive record
        item: ArchivedItem,
    },

    /// Account added to the registry
    AccountAdded {
        /// The new account
        account: Account,
    },

    /// Account removed from the registry
    AccountRemoved {
        /// Removed account id
        id: AccountId,
    },

    /// Account status changed (by a user or by the scheduler)
    AccountStatusChanged {
        /// Account id
        id: AccountId,
        /// New status
        status: AccountStatus,
    },

    /// Automatic monitoring switched on
    SchedulerStarted,

    /// Automatic monitoring switched off
    SchedulerStopped,

    /// Check interval changed
    IntervalChanged {
        /// New interval
        interval_seconds: u64,
    },

    /// A cycle began
    CycleStarted {
        /// Number of active accounts in the cycle snapshot
        accounts: usize,
    },

    /// A cycle finished
    CycleCompleted {
        /// Cycle summary
        report: CycleReport,
    },

    /// A due cycle was skipped because another was still running
    CycleSkipped,

    /// Graceful shutdown initiated
    Shutdown,
}
