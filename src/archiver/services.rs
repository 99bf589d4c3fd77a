//! Background service starters: the one-second clock and the REST API server.

use crate::error::Result;
use crate::scheduler::TickOutcome;
use std::sync::Arc;
use std::time::Duration;

use super::Archiver;

/// Period of the clock driving the countdown
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

impl Archiver {
    /// Start the clock task that advances the countdown once per second
    ///
    /// Calling this again while the clock is running does nothing. The task ends on
    /// [`shutdown`](Self::shutdown); a failing cycle never stops it.
    pub async fn spawn_clock(&self) {
        let mut slot = self.clock.lock().await;
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::debug!("Clock task already running");
            return;
        }

        let archiver = self.clone();
        let cancel = self.shutdown_token.clone();
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLOCK_PERIOD);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; later ticks are measured from its deadline
            let mut last = interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Clock task stopping");
                        break;
                    }
                    now = interval.tick() => {
                        let elapsed = now.saturating_duration_since(last);
                        last = now;
                        match archiver.scheduler.tick(elapsed).await {
                            TickOutcome::Dispatched(_) => {
                                tracing::debug!("Automatic check cycle dispatched");
                            }
                            TickOutcome::Skipped => {
                                tracing::debug!("Automatic check cycle skipped");
                            }
                            TickOutcome::Idle | TickOutcome::Counting { .. } => {}
                        }
                    }
                }
            }
        }));

        tracing::info!("Clock task started");
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on the configured bind address (default: 127.0.0.1:6790).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let archiver = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(archiver, config).await })
    }
}
