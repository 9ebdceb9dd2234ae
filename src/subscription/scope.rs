//! # Grouped unsubscribe.
//!
//! [`SubscriptionScope`] owns a set of subscriptions and releases all of them
//! at once, on [`SubscriptionScope::close`] or when dropped. It is the natural
//! companion of a component, request or connection that subscribes to several
//! channels and should leave all of them when it goes away.
//!
//! ```rust
//! use fetchvisor::{ExecutionScope, Manager, OperationFn, SubscriptionOptions, SubscriptionScope};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let manager = Manager::default();
//! let echo = OperationFn::arc("echo", |(n,): (u32,), _s: ExecutionScope| async move { Ok(n) });
//!
//! let scope = SubscriptionScope::new();
//! let a = scope.subscribe(&manager, &echo, &(1,), SubscriptionOptions::new())?;
//! scope.subscribe(&manager, &echo, &(2,), SubscriptionOptions::new())?;
//! assert_eq!(manager.channel_count(), 2);
//!
//! drop(scope);
//! assert!(!a.is_subscribed());
//! assert_eq!(manager.channel_count(), 0);
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    core::Manager,
    error::SignatureError,
    operations::Operation,
    subscription::{Subscription, SubscriptionOptions},
};

type Release = Box<dyn FnOnce() + Send + 'static>;

/// Releases every tracked subscription when closed or dropped.
pub struct SubscriptionScope {
    /// `None` once closed.
    releases: Mutex<Option<Vec<Release>>>,
}

impl SubscriptionScope {
    /// Creates an empty, open scope.
    pub fn new() -> Self {
        Self {
            releases: Mutex::new(Some(Vec::new())),
        }
    }

    /// Subscribes through `manager` and tracks the result.
    pub fn subscribe<O, A>(
        &self,
        manager: &Manager,
        operation: &Arc<O>,
        args: &A,
        options: SubscriptionOptions,
    ) -> Result<Subscription<O>, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        let subscription = manager.subscribe(operation, args, options)?;
        self.track(&subscription);
        Ok(subscription)
    }

    /// Tracks an existing subscription.
    ///
    /// The scope keeps a clone, so `Caller` subscriptions stay attached until the
    /// scope closes. Tracking on a closed scope unsubscribes immediately.
    pub fn track<O: Operation>(&self, subscription: &Subscription<O>) {
        let held = subscription.clone();
        let release: Release = Box::new(move || held.unsubscribe());

        let mut guard = self.releases.lock();
        match guard.as_mut() {
            Some(list) => list.push(release),
            None => {
                drop(guard);
                release();
            }
        }
    }

    /// Number of tracked subscriptions.
    pub fn len(&self) -> usize {
        self.releases.lock().as_ref().map_or(0, Vec::len)
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once closed.
    pub fn is_closed(&self) -> bool {
        self.releases.lock().is_none()
    }

    /// Unsubscribes everything tracked so far. Idempotent.
    pub fn close(&self) {
        let pending = self.releases.lock().take();
        for release in pending.into_iter().flatten() {
            release();
        }
    }
}

impl Default for SubscriptionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("tracked", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
