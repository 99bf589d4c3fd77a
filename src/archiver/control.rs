//! Scheduler control: run/pause, manual checks and the check interval.

use crate::error::{Error, Result};
use crate::scheduler::{CycleDispatch, TickOutcome};
use std::time::Duration;

use super::Archiver;

impl Archiver {
    /// Switch automatic monitoring on (no-op if already running)
    ///
    /// Returns whether the mode changed.
    pub async fn start(&self) -> bool {
        self.scheduler.start().await
    }

    /// Switch automatic monitoring off (no-op if already paused)
    ///
    /// A cycle that is already running finishes normally.
    pub async fn stop(&self) -> bool {
        self.scheduler.stop().await
    }

    /// Check every active account now and wait for the cycle to finish
    ///
    /// Works in either mode and always re-arms the countdown. Returns
    /// [`CycleDispatch::Skipped`] when another cycle is still running.
    ///
    /// # Errors
    ///
    /// [`Error::ShuttingDown`] after shutdown.
    pub async fn trigger_manual_check(&self) -> Result<CycleDispatch> {
        if self.is_shutting_down() {
            return Err(Error::ShuttingDown);
        }
        Ok(self.scheduler.trigger_manual_check().await)
    }

    /// Change the interval between automatic cycles
    ///
    /// The countdown already in progress is left alone; the new interval applies from the
    /// next cycle.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInterval`] outside 600..=7200 seconds.
    pub async fn set_check_interval(&self, seconds: u64) -> Result<()> {
        self.scheduler.set_interval(seconds).await
    }

    /// Advance the countdown by `elapsed`
    ///
    /// The clock task spawned by [`spawn_clock`](Self::spawn_clock) calls this every
    /// second; embedders driving their own clock can call it instead.
    pub async fn tick(&self, elapsed: Duration) -> TickOutcome {
        self.scheduler.tick(elapsed).await
    }
}
