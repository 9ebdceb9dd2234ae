//! # Polling scheduler
//!
//! Coalesces the polling intervals of a channel's subscribers into a single
//! timer. The scheduler owns the timing decisions; the channel owns the timer
//! task itself and calls back into [`Scheduler::rearm`] whenever its state
//! changes.
//!
//! ## Rules
//! - Effective interval is the **minimum** of the subscribers' intervals
//!   (duplicates behave as one). No polling subscriber, no timer.
//! - At most one timer is armed at a time: rearming cancels the previous one.
//! - An errored channel is never armed; polling resumes after a successful
//!   manual refresh.
//! - The delay honors time already elapsed since the last execution:
//!   `delay = max(0, interval - (now - last_execution))`.
//!
//! ## Example
//! ```text
//! subscribers: {10ms, 20ms} ──► interval 10ms
//! last_execution = t0, now = t0 + 4ms ──► delay 6ms
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Timer state of one channel.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    timer: Option<CancellationToken>,
    last_execution: Option<Instant>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the start of an execution.
    pub(crate) fn mark_execution(&mut self, at: Instant) {
        self.last_execution = Some(at);
    }

    /// Time elapsed since the last execution started (`None` if none yet).
    pub(crate) fn since_last(&self, now: Instant) -> Option<Duration> {
        self.last_execution.map(|last| now.saturating_duration_since(last))
    }

    /// Returns `true` while a timer is armed.
    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Cancels the pending timer, if any.
    pub(crate) fn clear(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }

    /// Forgets a timer that just fired, if it is the armed one.
    pub(crate) fn fired(&mut self, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return false;
        }
        self.timer = None;
        true
    }

    /// Clears the pending timer and, if polling applies, arms a new one.
    ///
    /// Returns the new timer's token and its delay; the caller spawns the task.
    pub(crate) fn rearm(
        &mut self,
        interval: Option<Duration>,
        errored: bool,
        now: Instant,
    ) -> Option<(CancellationToken, Duration)> {
        self.clear();
        let interval = interval.filter(|_| !errored)?;
        let delay = next_delay(interval, self.last_execution, now);

        let token = CancellationToken::new();
        self.timer = Some(token.clone());
        Some((token, delay))
    }
}

/// Minimum of the given intervals; `None` when empty.
pub(crate) fn effective_interval(intervals: impl IntoIterator<Item = Duration>) -> Option<Duration> {
    intervals.into_iter().min()
}

/// Remaining wait before the next poll is due.
pub(crate) fn next_delay(interval: Duration, last: Option<Instant>, now: Instant) -> Duration {
    match last {
        Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}
