//! # Refresh admission policy
//!
//! A channel runs **one** execution at a time. When a refresh arrives while an
//! execution is still loading, the admission policy decides what to do with it.
//!
//! ## Variants
//! - `Queue`: **Remember** the request; exactly one follow-up execution starts
//!   when the current one completes, however many requests arrived meanwhile.
//! - `DropIfLoading`: **Ignore** the request; the in-flight result stands.
//!
//! ## Invariants
//! - Executions of one channel never overlap.
//! - A follow-up execution is subject to pause (it may end up marked `late`).

/// Policy controlling how refreshes are handled while a channel is loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Skip the refresh if an execution is in flight.
    ///
    /// Use when:
    /// - Any fresh-enough result will do
    /// - Redundant work should be avoided
    /// - Example: dashboards polling slow endpoints
    DropIfLoading,

    /// Coalesce refreshes into a single follow-up execution.
    ///
    /// Use when:
    /// - A refresh signals that data changed after the in-flight call started
    /// - Example: refetch after a mutation
    #[default]
    Queue,
}

impl AdmissionPolicy {
    /// Returns a short stable label (snake_case) for use in events/logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionPolicy::DropIfLoading => "dropped",
            AdmissionPolicy::Queue => "queued",
        }
    }
}
