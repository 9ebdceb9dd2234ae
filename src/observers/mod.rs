//! # Event observers for fetchvisor.
//!
//! This module provides the [`Observer`] trait and the [`ObserverSet`] fan-out
//! used by a [`Manager`](crate::Manager) to deliver lifecycle events.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Channel ── publish(Event) ──► Bus ──► Manager observer listener
//!                                              │
//!                                              └──► ObserverSet::emit_arc(Event)
//!                                                        │
//!                                              ┌─────────┼─────────┐
//!                                              ▼         ▼         ▼
//!                                          LogWriter  Inspector  Custom
//! ```

mod observer;
mod observer_set;

#[cfg(feature = "logging")]
mod log;

pub(crate) use observer_set::panic_message;

pub use observer::Observer;
pub use observer_set::ObserverSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
