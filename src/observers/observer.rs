//! # Observer: user-facing event handlers
//!
//! The [`Observer`] trait is the **extension point** for inspection tooling.
//! Every lifecycle [`Event`] published by a manager and its channels flows
//! through the bus and into observers.
//!
//! Implementing your own observer allows you to plug in:
//! - a developer inspector / event timeline;
//! - metrics export;
//! - structured logging.
//!
//! ## Contract
//! - Each observer is driven by a dedicated worker fed by a bounded queue owned
//!   by the [`ObserverSet`](crate::ObserverSet). Slow observers never block a
//!   channel nor other observers.
//! - On queue overflow, events for that observer are **dropped**.
//! - Observers are strictly passive: nothing they do feeds back into channel state.
//!
//! # Example: custom observer
//! ```no_run
//! use fetchvisor::{Event, EventKind, Observer};
//! use async_trait::async_trait;
//!
//! struct Timeline;
//!
//! #[async_trait]
//! impl Observer for Timeline {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::ExecutionFailed = event.kind {
//!             println!("[timeline] {:?} failed: {:?}", event.signature, event.reason);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "timeline"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// # Trait for receiving lifecycle events from the bus.
///
/// Called from an observer-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Called for every emitted [`Event`].
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
