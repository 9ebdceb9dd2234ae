//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the manager, its channels and the
//! observer workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Manager` (channel created/removed), `Channel` (everything
//!   else), `ObserverSet` workers (overflow/panic).
//! - **Consumers**: the manager's observer listener, which fans out to the
//!   `ObserverSet`. Without observers nothing listens and publishing is free.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
