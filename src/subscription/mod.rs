//! # Subscriptions.
//!
//! This module provides the caller-facing side of a channel:
//! - [`Subscription`] handle mirroring channel state
//! - [`SubscriptionState`] mirrored snapshot
//! - [`SubscriptionOptions`], [`RefreshOptions`], [`Lifecycle`] per-caller knobs
//! - [`SubscriptionScope`] grouped unsubscribe

mod options;
mod scope;
mod state;
mod subscription;

pub use options::{ErrorCallback, Lifecycle, RefreshOptions, SubscriptionId, SubscriptionOptions};
pub use scope::SubscriptionScope;
pub use state::SubscriptionState;
pub use subscription::Subscription;
