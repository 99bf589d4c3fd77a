//! Graceful shutdown.

use crate::error::Result;
use crate::types::Event;
use std::time::Duration;

use super::Archiver;

/// How long shutdown waits for a running cycle
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl Archiver {
    /// Gracefully shut down the archiver
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Cancels the shutdown token (the clock stops, a running cycle stops between
    ///    accounts and between items)
    /// 2. Waits for the clock task to exit
    /// 3. Waits for a running cycle to finish, up to 30 seconds
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Calling it twice is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");
        self.shutdown_token.cancel();

        if let Some(clock) = self.clock.lock().await.take() {
            if let Err(e) = clock.await {
                tracing::warn!(error = %e, "Clock task ended abnormally");
            }
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_cycle()).await {
            Ok(()) => tracing::info!("No check cycle running"),
            Err(_) => {
                tracing::warn!("Timeout waiting for the running check cycle, proceeding with shutdown")
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    async fn wait_for_cycle(&self) {
        while self.scheduler.is_cycle_running() {
            tracing::debug!("Waiting for check cycle to complete");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
