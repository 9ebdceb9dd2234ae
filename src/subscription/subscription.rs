//! # Subscription handle.
//!
//! A [`Subscription`] is one caller's view of a shared channel. It mirrors the
//! channel's state, carries the caller's options and lets the caller refresh,
//! await resolution or leave.
//!
//! ## Rules
//! - Clones share one subscription; `unsubscribe` is idempotent across clones.
//! - [`Lifecycle::Caller`] subscriptions unsubscribe when the last clone drops.
//! - [`Lifecycle::Extended`] subscriptions stay attached until `unsubscribe()`.
//! - After `unsubscribe()` the mirrored state freezes and `refresh()` does nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::{
    core::channel::Channel,
    error::{ExecutionError, ResolveError},
    operations::Operation,
    signature::Signature,
    subscription::{Lifecycle, RefreshOptions, SubscriptionId, SubscriptionState},
};

struct SubscriptionInner<O: Operation> {
    id: SubscriptionId,
    channel: Arc<Channel<O>>,
    rx: watch::Receiver<SubscriptionState<O::Output>>,
    lifecycle: Lifecycle,
    subscribed: AtomicBool,
}

impl<O: Operation> SubscriptionInner<O> {
    fn release(&self) {
        if self.subscribed.swap(false, Ordering::AcqRel) {
            self.channel.unsubscribe(self.id);
        }
    }
}

impl<O: Operation> Drop for SubscriptionInner<O> {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Caller {
            self.release();
        }
    }
}

/// Caller handle bound to one channel.
pub struct Subscription<O: Operation> {
    inner: Arc<SubscriptionInner<O>>,
}

impl<O: Operation> Subscription<O> {
    pub(crate) fn new(
        id: SubscriptionId,
        channel: Arc<Channel<O>>,
        rx: watch::Receiver<SubscriptionState<O::Output>>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                id,
                channel,
                rx,
                lifecycle,
                subscribed: AtomicBool::new(true),
            }),
        }
    }

    /// Unique id of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    /// Signature of the channel this subscription is bound to.
    pub fn signature(&self) -> &Signature {
        self.inner.channel.signature()
    }

    /// Name of the subscribed operation.
    pub fn operation_name(&self) -> &str {
        self.inner.channel.operation_name()
    }

    /// Lifecycle chosen at subscribe time.
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle
    }

    /// An execution is in flight.
    pub fn loading(&self) -> bool {
        self.inner.rx.borrow().loading
    }

    /// Last successful result.
    pub fn response(&self) -> Option<O::Output> {
        self.inner.rx.borrow().response.clone()
    }

    /// The last execution failed.
    pub fn errored(&self) -> bool {
        self.inner.rx.borrow().errored
    }

    /// Error of the last failed execution.
    pub fn error(&self) -> Option<ExecutionError> {
        self.inner.rx.borrow().error.clone()
    }

    /// At least one execution has completed.
    pub fn executed(&self) -> bool {
        self.inner.rx.borrow().executed
    }

    /// The channel is paused.
    pub fn paused(&self) -> bool {
        self.inner.rx.borrow().paused
    }

    /// An execution was requested while paused.
    pub fn late(&self) -> bool {
        self.inner.rx.borrow().late
    }

    /// Snapshot of every mirrored field.
    pub fn state(&self) -> SubscriptionState<O::Output> {
        self.inner.rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    ///
    /// The sender side closes when this subscription is unsubscribed.
    pub fn watch(&self) -> watch::Receiver<SubscriptionState<O::Output>> {
        self.inner.rx.clone()
    }

    /// Refreshes the channel now.
    pub fn refresh(&self) {
        self.refresh_with(RefreshOptions::default());
    }

    /// Refreshes the channel unless it executed less than `max_refresh_rate` ago.
    pub fn refresh_with(&self, options: RefreshOptions) {
        if self.is_subscribed() {
            self.inner.channel.refresh(options);
        }
    }

    /// Detaches from the channel. Idempotent.
    ///
    /// The last subscriber leaving tears the channel down.
    pub fn unsubscribe(&self) {
        self.inner.release();
    }

    /// Returns `false` once unsubscribed.
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscribed.load(Ordering::Acquire)
    }

    /// Waits for the channel to resolve.
    ///
    /// Returns immediately when the channel already executed; otherwise waits
    /// for the first completion.
    ///
    /// # Errors
    /// - [`ResolveError::Failed`] when the resolved state is errored.
    /// - [`ResolveError::Aborted`] when unsubscribed before resolution.
    pub async fn future(&self) -> Result<SubscriptionState<O::Output>, ResolveError> {
        if !self.is_subscribed() {
            return Err(ResolveError::Aborted);
        }

        let mut rx = self.inner.rx.clone();
        let state = match rx.wait_for(|s| s.executed).await {
            Ok(current) => (*current).clone(),
            Err(_) => return Err(ResolveError::Aborted),
        };

        match (state.errored, &state.error) {
            (true, Some(error)) => Err(ResolveError::Failed(error.clone())),
            _ => Ok(state),
        }
    }
}

impl<O: Operation> Clone for Subscription<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Operation> std::fmt::Debug for Subscription<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("signature", &self.signature().to_string())
            .field("lifecycle", &self.inner.lifecycle)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
