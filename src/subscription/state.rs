//! # Mirrored channel state.
//!
//! [`SubscriptionState`] is the snapshot every subscription of a channel sees.
//! Channels publish it through a `tokio::sync::watch` channel per subscriber,
//! so readers never take the channel lock.

use crate::error::ExecutionError;

/// Snapshot of a channel's execution state.
///
/// ```text
/// Unexecuted ──► Loading ──► Ready    (executed, !errored, response = Some)
///                   ▲    └─► Errored  (executed, errored,  error = Some)
///                   └──── refresh / timer / resume
/// ```
///
/// `paused` is orthogonal to the above; `late` is only meaningful while paused
/// and records that an execution was requested and deferred.
#[derive(Clone, Debug)]
pub struct SubscriptionState<R> {
    /// An execution is in flight.
    pub loading: bool,
    /// Last successful result. Kept across later failures.
    pub response: Option<R>,
    /// The last execution failed.
    pub errored: bool,
    /// Error of the last failed execution; cleared by the next success.
    pub error: Option<ExecutionError>,
    /// At least one execution has completed.
    pub executed: bool,
    /// The channel is paused.
    pub paused: bool,
    /// An execution was requested while paused.
    pub late: bool,
}

impl<R> SubscriptionState<R> {
    /// Returns `true` once an execution has completed successfully and no
    /// failure happened since.
    pub fn is_ready(&self) -> bool {
        self.executed && !self.errored
    }
}

impl<R: PartialEq> SubscriptionState<R> {
    /// Field-wise comparison; errors compare by identity.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        let same_error = match (&self.error, &other.error) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        same_error
            && self.loading == other.loading
            && self.errored == other.errored
            && self.executed == other.executed
            && self.paused == other.paused
            && self.late == other.late
            && self.response == other.response
    }
}

impl<R> Default for SubscriptionState<R> {
    fn default() -> Self {
        Self {
            loading: false,
            response: None,
            errored: false,
            error: None,
            executed: false,
            paused: false,
            late: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_compare_by_identity() {
        let err = ExecutionError::failed(anyhow::anyhow!("boom"));
        let a = SubscriptionState::<u8> {
            errored: true,
            executed: true,
            error: Some(err.clone()),
            ..Default::default()
        };
        let mut b = a.clone();
        assert!(a.same_as(&b));

        b.error = Some(ExecutionError::failed(anyhow::anyhow!("boom")));
        assert!(!a.same_as(&b));
        assert!(!a.is_ready());
    }
}
