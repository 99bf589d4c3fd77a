//! Run/pause state machine and countdown, advanced by explicit ticks

use crate::types::SchedulerMode;
use std::time::Duration;

/// Countdown to the next automatic cycle
///
/// Pure state: nothing here sleeps or spawns. The owner feeds elapsed time through
/// [`tick`](Countdown::tick) and acts when it reports the countdown is due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    mode: SchedulerMode,
    interval: Duration,
    armed_interval: Duration,
    remaining: Duration,
}

impl Countdown {
    /// Paused countdown armed with `interval_seconds`
    pub fn new(interval_seconds: u64) -> Self {
        let interval = Duration::from_secs(interval_seconds);
        Self {
            mode: SchedulerMode::Paused,
            interval,
            armed_interval: interval,
            remaining: interval,
        }
    }

    /// Switch to Running and re-arm; returns false if already running
    pub fn start(&mut self) -> bool {
        if self.mode == SchedulerMode::Running {
            return false;
        }
        self.mode = SchedulerMode::Running;
        self.reset();
        true
    }

    /// Switch to Paused; returns false if already paused
    pub fn stop(&mut self) -> bool {
        if self.mode == SchedulerMode::Paused {
            return false;
        }
        self.mode = SchedulerMode::Paused;
        true
    }

    /// Advance by `elapsed`; returns true when the countdown has reached zero
    ///
    /// Always false while paused. The countdown stays at zero until [`reset`](Self::reset).
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.mode == SchedulerMode::Paused {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining.is_zero()
    }

    /// Re-arm with the current interval
    pub fn reset(&mut self) {
        self.armed_interval = self.interval;
        self.remaining = self.interval;
    }

    /// Change the interval used by the next reset (the running countdown is untouched)
    pub fn set_interval(&mut self, interval_seconds: u64) {
        self.interval = Duration::from_secs(interval_seconds);
    }

    /// Current mode
    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    /// Whether automatic cycles are scheduled
    pub fn is_running(&self) -> bool {
        self.mode == SchedulerMode::Running
    }

    /// Configured interval in seconds
    pub fn interval_seconds(&self) -> u64 {
        self.interval.as_secs()
    }

    /// Interval that was in force at the last reset, in seconds
    #[cfg(test)]
    fn armed_interval_seconds(&self) -> u64 {
        self.armed_interval.as_secs()
    }

    /// Whole seconds left, rounded up so a partly elapsed second still shows
    pub fn remaining_seconds(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}
