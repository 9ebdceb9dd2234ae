//! # LogWriter: tracing-backed event printer
//!
//! A minimal observer that renders incoming [`Event`]s as `tracing` records.
//! Useful for demos and debugging; install a `tracing` subscriber to see them.
//!
//! ## Example output
//! ```text
//! [channel-created] signature="0-[1]" op="fetch_user"
//! [subscribed] signature="0-[1]" subscription=0 interval_ms=Some(500)
//! [started] signature="0-[1]" op="fetch_user"
//! [failed] signature="0-[1]" err="operation failed: 503"
//! [channel-removed] signature="0-[1]" op="fetch_user"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observer;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observer for LogWriter {
    async fn on_event(&self, e: &Event) {
        let sig = e.signature.as_deref().unwrap_or("-");
        let op = e.operation.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ChannelCreated => {
                tracing::info!("[channel-created] signature={sig:?} op={op:?}");
            }
            EventKind::ChannelRemoved => {
                tracing::info!("[channel-removed] signature={sig:?} op={op:?}");
            }
            EventKind::SubscriptionCreated => {
                tracing::info!(
                    "[subscribed] signature={sig:?} subscription={:?} interval_ms={:?}",
                    e.subscription,
                    e.interval_ms
                );
            }
            EventKind::SubscriptionRemoved => {
                tracing::info!(
                    "[unsubscribed] signature={sig:?} subscription={:?} interval_ms={:?}",
                    e.subscription,
                    e.interval_ms
                );
            }
            EventKind::ExecutionStarted => {
                tracing::info!("[started] signature={sig:?} op={op:?}");
            }
            EventKind::ExecutionSucceeded => {
                tracing::info!("[succeeded] signature={sig:?} note={:?}", e.reason);
            }
            EventKind::ExecutionFailed => {
                tracing::warn!("[failed] signature={sig:?} err={:?}", e.reason);
            }
            EventKind::RefreshRequested => {
                tracing::info!("[refresh] signature={sig:?}");
            }
            EventKind::RefreshDebounced => {
                tracing::info!(
                    "[refresh-debounced] signature={sig:?} since_last_ms={:?}",
                    e.delay_ms
                );
            }
            EventKind::RefreshQueued => {
                tracing::info!("[refresh-while-loading] signature={sig:?} action={:?}", e.reason);
            }
            EventKind::Paused => {
                tracing::info!("[paused] signature={sig:?}");
            }
            EventKind::Resumed => {
                tracing::info!("[resumed] signature={sig:?}");
            }
            EventKind::LateMarked => {
                tracing::info!("[late] signature={sig:?}");
            }
            EventKind::ObserverOverflow => {
                tracing::warn!("[observer-overflow] observer={op:?} reason={:?}", e.reason);
            }
            EventKind::ObserverPanicked => {
                tracing::warn!("[observer-panicked] observer={op} info={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
