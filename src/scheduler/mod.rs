//! Countdown-driven cycle scheduler
//!
//! The scheduler owns the run/pause state, the countdown to the next automatic cycle and
//! the guard that keeps two cycles from overlapping. Time only moves through
//! [`Scheduler::tick`], which the archiver's clock task calls once per second; tests call
//! it directly with any elapsed duration.
//!
//! A cycle walks a snapshot of the Active accounts in registry order and runs the
//! [`FetchPipeline`] for each one on its own task, so a panicking backend costs one
//! account rather than the whole cycle.

pub mod countdown;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::validate_interval;
use crate::error::Result;
use crate::event_log::LogWriter;
use crate::pipeline::{CycleOutcome, FetchPipeline};
use crate::registry::AccountRegistry;
use crate::types::{
    Account, AccountStatus, CycleReport, Event, LogAction, SchedulerStatus, Severity,
};
use chrono::{DateTime, Utc};
use countdown::Countdown;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of advancing the clock
#[derive(Debug)]
pub enum TickOutcome {
    /// The scheduler is paused; nothing changed
    Idle,
    /// Still counting down
    Counting {
        /// Seconds until the next cycle
        remaining_seconds: u64,
    },
    /// A cycle was started on a worker task
    Dispatched(JoinHandle<CycleReport>),
    /// A cycle was due but the previous one is still running
    Skipped,
}

/// Result of a manual check request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleDispatch {
    /// The cycle ran to the end
    Completed(CycleReport),
    /// Another cycle was already running
    Skipped,
}

#[derive(Default)]
struct CycleTimes {
    last_started: Option<DateTime<Utc>>,
    last_finished: Option<DateTime<Utc>>,
}

struct SchedulerInner {
    countdown: Mutex<Countdown>,
    cycle_running: AtomicBool,
    cycles_completed: AtomicU64,
    cycles_skipped: AtomicU64,
    times: Mutex<CycleTimes>,
    registry: Arc<RwLock<AccountRegistry>>,
    pipeline: Arc<FetchPipeline>,
    log: LogWriter,
    cancel: CancellationToken,
}

/// Releases the single-cycle guard when the cycle ends, panics included
struct CycleGuard {
    inner: Arc<SchedulerInner>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.inner.cycle_running.store(false, Ordering::SeqCst);
    }
}

/// Cloneable handle to the scheduler
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Create a paused scheduler
    ///
    /// `interval_seconds` is expected to be validated already (see
    /// [`validate_interval`]).
    pub fn new(
        interval_seconds: u64,
        registry: Arc<RwLock<AccountRegistry>>,
        pipeline: Arc<FetchPipeline>,
        log: LogWriter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                countdown: Mutex::new(Countdown::new(interval_seconds)),
                cycle_running: AtomicBool::new(false),
                cycles_completed: AtomicU64::new(0),
                cycles_skipped: AtomicU64::new(0),
                times: Mutex::new(CycleTimes::default()),
                registry,
                pipeline,
                log,
                cancel,
            }),
        }
    }

    /// Switch automatic monitoring on; returns false if it already was
    pub async fn start(&self) -> bool {
        if !self.inner.countdown.lock().await.start() {
            return false;
        }

        tracing::info!("Scheduler started");
        self.inner
            .log
            .system(
                LogAction::CheckStarted,
                Severity::Success,
                "System started. Auto-monitoring active.",
            )
            .await;
        self.inner.log.emit(Event::SchedulerStarted);
        true
    }

    /// Switch automatic monitoring off; an in-flight cycle finishes normally
    pub async fn stop(&self) -> bool {
        if !self.inner.countdown.lock().await.stop() {
            return false;
        }

        tracing::info!("Scheduler paused");
        self.inner
            .log
            .system(
                LogAction::CheckCompleted,
                Severity::Info,
                "System paused by user.",
            )
            .await;
        self.inner.log.emit(Event::SchedulerStopped);
        true
    }

    /// Advance the countdown by `elapsed`, dispatching a cycle when it runs out
    ///
    /// Never waits for the cycle itself.
    pub async fn tick(&self, elapsed: Duration) -> TickOutcome {
        {
            let mut countdown = self.inner.countdown.lock().await;
            if !countdown.is_running() {
                return TickOutcome::Idle;
            }
            if !countdown.tick(elapsed) {
                return TickOutcome::Counting {
                    remaining_seconds: countdown.remaining_seconds(),
                };
            }
            countdown.reset();
        }

        let Some(guard) = self.try_begin_cycle() else {
            self.record_skip().await;
            return TickOutcome::Skipped;
        };

        let scheduler = self.clone();
        TickOutcome::Dispatched(tokio::spawn(async move {
            let report = scheduler.run_cycle(guard).await;
            scheduler.reset_countdown().await;
            report
        }))
    }

    /// Run a full cycle now, in either mode
    ///
    /// Waits for the cycle to finish. The countdown is re-armed whether or not the
    /// cycle could run.
    pub async fn trigger_manual_check(&self) -> CycleDispatch {
        let Some(guard) = self.try_begin_cycle() else {
            self.record_skip().await;
            self.reset_countdown().await;
            return CycleDispatch::Skipped;
        };
        self.reset_countdown().await;

        let scheduler = self.clone();
        let report = match tokio::spawn(async move { scheduler.run_cycle(guard).await }).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Manual check task failed");
                CycleReport::default()
            }
        };

        self.reset_countdown().await;
        CycleDispatch::Completed(report)
    }

    /// Change the interval between automatic cycles
    ///
    /// The running countdown keeps going; the new interval applies from the next reset.
    pub async fn set_interval(&self, seconds: u64) -> Result<()> {
        let seconds = validate_interval(seconds)?;
        self.inner.countdown.lock().await.set_interval(seconds);

        tracing::info!(interval_seconds = seconds, "Check interval changed");
        self.inner.log.emit(Event::IntervalChanged {
            interval_seconds: seconds,
        });
        Ok(())
    }

    /// Snapshot of the scheduler state
    pub async fn status(&self) -> SchedulerStatus {
        let (mode, interval_seconds, remaining_seconds) = {
            let countdown = self.inner.countdown.lock().await;
            (
                countdown.mode(),
                countdown.interval_seconds(),
                countdown.remaining_seconds(),
            )
        };
        let times = self.inner.times.lock().await;

        SchedulerStatus {
            mode,
            interval_seconds,
            remaining_seconds,
            cycle_running: self.is_cycle_running(),
            cycles_completed: self.inner.cycles_completed.load(Ordering::SeqCst),
            cycles_skipped: self.inner.cycles_skipped.load(Ordering::SeqCst),
            last_cycle_started_at: times.last_started,
            last_cycle_finished_at: times.last_finished,
        }
    }

    /// Whether a cycle is executing right now
    pub fn is_cycle_running(&self) -> bool {
        self.inner.cycle_running.load(Ordering::SeqCst)
    }

    fn try_begin_cycle(&self) -> Option<CycleGuard> {
        self.inner
            .cycle_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CycleGuard {
                inner: self.inner.clone(),
            })
    }

    async fn reset_countdown(&self) {
        self.inner.countdown.lock().await.reset();
    }

    async fn record_skip(&self) {
        self.inner.cycles_skipped.fetch_add(1, Ordering::SeqCst);
        tracing::warn!("Check cycle due while the previous one is still running; skipping");
        self.inner
            .log
            .system(
                LogAction::Skipped,
                Severity::Info,
                "Previous check still running. Skipping this cycle.",
            )
            .await;
        self.inner.log.emit(Event::CycleSkipped);
    }

    async fn run_cycle(&self, _guard: CycleGuard) -> CycleReport {
        let inner = &self.inner;
        let started = Utc::now();
        inner.times.lock().await.last_started = Some(started);

        let accounts = inner.registry.read().await.active();
        let mut report = CycleReport {
            started_at: Some(started),
            ..Default::default()
        };

        inner.log.emit(Event::CycleStarted {
            accounts: accounts.len(),
        });

        if accounts.is_empty() {
            tracing::debug!("No active accounts to check");
        } else {
            tracing::info!(accounts = accounts.len(), "Starting check cycle");
            inner
                .log
                .system(
                    LogAction::CheckStarted,
                    Severity::Info,
                    format!("Starting batch check for {} users...", accounts.len()),
                )
                .await;

            for account in accounts {
                if inner.cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                self.check_account(account, &mut report).await;
            }

            let message = if report.cancelled {
                "Batch check interrupted by shutdown."
            } else {
                "Batch check completed. Waiting for next cycle."
            };
            inner
                .log
                .system(LogAction::CheckCompleted, Severity::Info, message)
                .await;
        }

        let finished = Utc::now();
        report.finished_at = Some(finished);
        inner.times.lock().await.last_finished = Some(finished);
        inner.cycles_completed.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            accounts_checked = report.accounts_checked,
            accounts_errored = report.accounts_errored,
            items_archived = report.items_archived,
            items_failed = report.items_failed,
            cancelled = report.cancelled,
            "Check cycle finished"
        );
        inner.log.emit(Event::CycleCompleted {
            report: report.clone(),
        });
        report
    }

    async fn check_account(&self, snapshot: Account, report: &mut CycleReport) {
        let inner = &self.inner;

        // The user may have removed or paused it since the snapshot was taken
        let current = inner.registry.read().await.get(snapshot.id);
        let Some(account) = current.filter(Account::is_active) else {
            tracing::debug!(handle = %snapshot.handle, "Account no longer active; skipping");
            return;
        };

        report.accounts_checked += 1;

        let pipeline = inner.pipeline.clone();
        let cancel = inner.cancel.clone();
        let task_account = account.clone();
        let joined =
            tokio::spawn(async move { pipeline.run(&task_account, &cancel).await }).await;

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                report.accounts_errored += 1;
                tracing::error!(handle = %account.handle, error = %e, "Account check aborted");
                inner
                    .log
                    .system(
                        LogAction::Failed,
                        Severity::Failure,
                        format!("Check for {} aborted unexpectedly: {}", account.handle, e),
                    )
                    .await;
                let mut registry = inner.registry.write().await;
                registry.mark_checked(account.id, Utc::now());
                registry.record_failure(account.id, format!("check aborted: {}", e), None);
                return;
            }
        };

        self.apply_outcome(&account, outcome, report).await;
    }

    async fn apply_outcome(
        &self,
        account: &Account,
        outcome: CycleOutcome,
        report: &mut CycleReport,
    ) {
        let inner = &self.inner;
        let now = Utc::now();

        let error = match outcome {
            CycleOutcome::NoNewContent => None,
            CycleOutcome::Completed(tally) => {
                report.items_found += tally.found;
                report.items_archived += tally.archived;
                report.items_failed += tally.failed;
                report.items_skipped += tally.skipped;
                report.cancelled |= tally.cancelled;
                None
            }
            CycleOutcome::Errored { error } => Some(error),
        };

        let Some(error) = error else {
            let mut registry = inner.registry.write().await;
            registry.mark_checked(account.id, now);
            registry.clear_error(account.id);
            return;
        };

        report.accounts_errored += 1;
        let park = error.requires_intervention();
        let still_registered = {
            let mut registry = inner.registry.write().await;
            registry.mark_checked(account.id, now);
            registry.record_failure(
                account.id,
                error.to_string(),
                park.then_some(AccountStatus::Error),
            )
        };

        if park && still_registered {
            tracing::warn!(
                handle = %account.handle,
                error = %error,
                "Account needs attention; monitoring suspended"
            );
            inner
                .log
                .system(
                    LogAction::Failed,
                    Severity::Failure,
                    format!(
                        "{} needs attention ({}). Monitoring suspended until re-enabled.",
                        account.handle, error
                    ),
                )
                .await;
            inner.log.emit(Event::AccountStatusChanged {
                id: account.id,
                status: AccountStatus::Error,
            });
        }
    }
}
