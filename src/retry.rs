//! Bounded retries with exponential backoff
//!
//! Media downloads and archive uploads go through [`with_retry`] so a flaky CDN or a
//! briefly unreachable storage backend does not cost an item. Content checks are never
//! retried here; the next cycle is their retry.
//!
//! ```no_run
//! use social_archiver::config::RetryConfig;
//! use social_archiver::retry::with_retry;
//! use social_archiver::SinkError;
//!
//! # async fn upload() -> Result<(), SinkError> { Ok(()) }
//! # async fn example() -> Result<(), SinkError> {
//! with_retry(&RetryConfig::default(), || upload()).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{FetchError, SinkError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or permanent
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(e) => e.is_timeout() || e.is_connect(),
            // Server-side trouble and throttling clear up on their own
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Io(e) => is_transient_io(e),
            FetchError::InvalidReference(_) | FetchError::TooLarge { .. } => false,
        }
    }
}

impl IsRetryable for SinkError {
    fn is_retryable(&self) -> bool {
        match self {
            SinkError::SinkUnavailable(_) => true,
            // Needs someone to free space
            SinkError::QuotaExceeded(_) => false,
            SinkError::InvalidName(_) => false,
        }
    }
}

fn is_transient_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::Interrupted
    )
}

/// Delay schedule for one retried operation
///
/// Yields `max_attempts` delays, growing by `backoff_multiplier` up to `max_delay`.
struct Backoff<'a> {
    config: &'a RetryConfig,
    next_delay: Duration,
    retries: u32,
}

impl<'a> Backoff<'a> {
    fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            next_delay: config.initial_delay,
            retries: 0,
        }
    }

    /// Delay before the next retry, or `None` once the budget is spent
    fn next_delay(&mut self) -> Option<Duration> {
        if self.retries >= self.config.max_attempts {
            return None;
        }
        self.retries += 1;
        let base = self.next_delay;
        self.next_delay = scale(base, self.config.backoff_multiplier).min(self.config.max_delay);
        Some(if self.config.jitter { add_jitter(base) } else { base })
    }
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget runs out
///
/// Only errors whose [`IsRetryable::is_retryable`] is true are retried. The last error is
/// returned unchanged.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);

    loop {
        let error = match operation().await {
            Ok(value) => {
                if backoff.retries > 0 {
                    tracing::info!(retries = backoff.retries, "Recovered after retrying");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            tracing::debug!(error = %error, "Permanent failure, not retrying");
            return Err(error);
        }

        let Some(delay) = backoff.next_delay() else {
            tracing::warn!(
                error = %error,
                retries = backoff.retries,
                "Giving up, retry budget exhausted"
            );
            return Err(error);
        };

        tracing::warn!(
            error = %error,
            retry = backoff.retries,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Transient failure, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

/// `delay * factor`, saturating at `Duration::MAX` instead of panicking
fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Stretch `delay` by a random factor in `[1, 2]` so parallel retries spread out
fn add_jitter(delay: Duration) -> Duration {
    scale(delay, 1.0 + rand::thread_rng().gen_range(0.0..=1.0))
}
