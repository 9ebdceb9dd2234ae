//! # fetchvisor
//!
//! **Fetchvisor** shares asynchronous "fetch" operations between many
//! independent callers.
//!
//! Identical `(operation, arguments)` pairs share a single in-flight or
//! most-recent execution, callers independently request polling cadences that
//! are coalesced into one timer, and every resource (timer, execution scope,
//! channel) is released exactly when the last caller leaves.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller A            caller B            caller C
//!  subscribe(op,[1])   subscribe(op,[1])   subscribe(op,[0])
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Manager                                                          │
//! │  - SignatureRegistry (operation identity + canonical JSON)        │
//! │  - channels: Signature ──► Channel                                │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────────────────┬─────────────────┘
//!        ▼ "0-[1]"                                  ▼ "0-[0]"
//!     ┌────────────────────────┐                 ┌────────────────────────┐
//!     │ Channel                │                 │ Channel                │
//!     │ - state (loading, ...) │                 │ - state (loading, ...) │
//!     │ - Scheduler (1 timer)  │                 │ - Scheduler (1 timer)  │
//!     │ - ExecutionScope       │                 │ - ExecutionScope       │
//!     └──┬──────────────┬──────┘                 └──────────┬─────────────┘
//!        │ watch        │ watch                             │ watch
//!        ▼              ▼                                   ▼
//!   Subscription A  Subscription B                    Subscription C
//!
//!  Channels publish events ──► Bus ──► observer_listener ──► ObserverSet
//!                                                     ┌─────────┼─────────┐
//!                                                     ▼         ▼         ▼
//!                                                 observer1 observer2 observerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! subscribe ──► Channel created (first subscriber) ──► execute
//!
//! execute {
//!   ├─ loading ─► AdmissionPolicy: Queue (one follow-up) / DropIfLoading
//!   ├─ paused  ─► late = true (runs on resume)
//!   └─ run:
//!        dispose previous scope, loading = true, last_execution = now, rearm timer
//!        operation.call(args, scope)
//!          ├─ Ok  ─► response, errored = false, rearm timer
//!          └─ Err ─► error, errored = true, stop timer, on_error callbacks
//!        executed = true, loading = false, late = queued while paused, fan out
//! }
//!
//! timer (min interval of subscribers) ──► refresh ──► execute
//! unsubscribe ──► rearm, or (last one) stop timer, dispose scope, evict channel
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                  |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------------|
//! | **Manager**       | Deduplicate subscriptions by signature, pause/resume all.    | [`Manager`], [`ManagerBuilder`]                     |
//! | **Subscriptions** | Mirror channel state, refresh, await resolution, leave.      | [`Subscription`], [`SubscriptionScope`]             |
//! | **Operations**    | Define fetches as trait impls or closures.                   | [`Operation`], [`OperationFn`], [`ExecutionScope`]  |
//! | **Signatures**    | Reference identity plus canonical arguments.                 | [`Signature`], [`SignatureRegistry`], [`Live`]      |
//! | **Observer API**  | Hook into lifecycle events (logging, metrics, inspection).   | [`Observer`], [`Event`]                             |
//! | **Policies**      | Choose how refreshes behave while loading.                   | [`AdmissionPolicy`]                                 |
//! | **Errors**        | Typed errors for signatures, executions and awaiting.        | [`SignatureError`], [`ExecutionError`], [`ResolveError`] |
//! | **Configuration** | Centralize manager settings.                                 | [`ManagerConfig`]                                   |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fetchvisor::{ExecutionScope, Manager, ManagerConfig, OperationFn, SubscriptionOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     // Build observers (optional)
//!     #[cfg(feature = "logging")]
//!     let observers: Vec<Arc<dyn fetchvisor::Observer>> = vec![Arc::new(fetchvisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let observers: Vec<Arc<dyn fetchvisor::Observer>> = Vec::new();
//!
//!     let manager = Manager::builder(ManagerConfig::default())
//!         .with_observers(observers)
//!         .build();
//!
//!     // Operations are identified by their Arc: create once, share clones.
//!     let user = OperationFn::arc("user", |(id,): (u64,), _scope: ExecutionScope| async move {
//!         Ok(format!("user-{id}"))
//!     });
//!
//!     let sub = manager.subscribe(
//!         &user,
//!         &(7,),
//!         SubscriptionOptions::new().with_interval(Duration::from_secs(30)),
//!     )?;
//!
//!     let state = sub.future().await?;
//!     assert_eq!(state.response.as_deref(), Some("user-7"));
//!
//!     sub.unsubscribe();
//!     assert_eq!(manager.channel_count(), 0);
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod observers;
mod operations;
mod policies;
mod signature;
mod subscription;

// ---- Public re-exports ----

pub use core::{Manager, ManagerBuilder, ManagerConfig};
pub use error::{ExecutionError, ResolveError, SignatureError};
pub use events::{Event, EventKind};
pub use observers::{Observer, ObserverSet};
pub use operations::{ExecutionScope, Operation, OperationFn};
pub use policies::AdmissionPolicy;
pub use signature::{Live, OperationId, Signature, SignatureRegistry};
pub use subscription::{
    ErrorCallback, Lifecycle, RefreshOptions, Subscription, SubscriptionId, SubscriptionOptions,
    SubscriptionScope, SubscriptionState,
};

// Optional: expose a simple built-in logger observer (demo/reference).
#[cfg(feature = "logging")]
pub use observers::LogWriter;
