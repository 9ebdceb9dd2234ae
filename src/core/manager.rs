//! # Manager: signature-keyed registry of channels.
//!
//! [`Manager`] is the entry point of the crate. It turns `(operation, args)`
//! into a [`Signature`], finds or creates the [`Channel`] for it and attaches a
//! new [`Subscription`].
//!
//! ## Architecture
//! ```text
//! subscribe(op, args, opts)
//!     ├─► SignatureRegistry::snapshot ──► Signature + plain args
//!     ├─► lookup channels[signature]
//!     │     ├─ open   ─► Channel::subscribe
//!     │     └─ absent ─► decode args, Channel::new, publish ChannelCreated
//!     └─► Subscription<O>
//!
//! Channel (last subscriber left) ──► evict(signature, channel)
//!                                     └─ removes the entry only if it is still that channel
//! ```
//!
//! ## Rules
//! - Exactly one open channel per signature.
//! - Lock order is registry, then channel; channels call back into the
//!   manager only after releasing their own lock.
//! - `pause`/`resume` only affect channels that exist at call time.
//! - No process-wide instance: construct one at the composition root and clone it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::ManagerBuilder,
        channel::{Channel, ChannelControl, ChannelParams},
        config::ManagerConfig,
    },
    error::SignatureError,
    events::{Bus, Event, EventKind},
    operations::Operation,
    signature::{Signature, SignatureRegistry},
    subscription::{RefreshOptions, Subscription, SubscriptionOptions},
};

/// Shared state behind every [`Manager`] clone.
pub(crate) struct ManagerInner {
    channels: Mutex<HashMap<Signature, Arc<dyn ChannelControl>>>,
    registry: SignatureRegistry,
    bus: Bus,
    config: Arc<ManagerConfig>,
    /// Stops the observer listener when the last clone is dropped.
    token: CancellationToken,
}

impl ManagerInner {
    pub(crate) fn new(config: ManagerConfig, bus: Bus, token: CancellationToken) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            registry: SignatureRegistry::new(),
            bus,
            config: Arc::new(config),
            token,
        }
    }

    /// Removes `signature` if it still maps to `channel`.
    pub(crate) fn evict(&self, signature: &Signature, channel: *const ()) -> bool {
        let removed = {
            let mut channels = self.channels.lock();
            match channels.get(signature) {
                Some(current) if std::ptr::addr_eq(Arc::as_ptr(current), channel) => {
                    channels.remove(signature)
                }
                _ => None,
            }
        };
        removed.is_some()
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Deduplicating front door for operations.
///
/// Cheap to clone; clones share channels, registry and event bus.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use fetchvisor::{ExecutionScope, Manager, OperationFn, SubscriptionOptions};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> anyhow::Result<()> {
///     let manager = Manager::default();
///     let is_one = OperationFn::arc("is_one", |(n,): (u32,), _s: ExecutionScope| async move {
///         Ok(n == 1)
///     });
///
///     let a = manager.subscribe(&is_one, &(1,), SubscriptionOptions::new())?;
///     let b = manager.subscribe(&is_one, &(1,), SubscriptionOptions::new())?;
///     assert_eq!(a.signature(), b.signature());
///     assert_eq!(manager.channel_count(), 1);
///
///     let state = a.future().await?;
///     assert_eq!(state.response, Some(true));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

impl Manager {
    /// Creates a manager without observers.
    pub fn new(config: ManagerConfig) -> Self {
        ManagerBuilder::new(config).build()
    }

    /// Returns a builder (observers, configuration).
    pub fn builder(config: ManagerConfig) -> ManagerBuilder {
        ManagerBuilder::new(config)
    }

    pub(crate) fn from_inner(inner: Arc<ManagerInner>) -> Self {
        Self { inner }
    }

    /// Returns the configuration shared by all channels.
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Subscribes to `operation` called with `args`.
    ///
    /// Equal `(operation reference, args)` pairs share one channel: the operation
    /// runs once for all of them. The first subscriber of a channel triggers its
    /// first execution.
    ///
    /// # Errors
    /// [`SignatureError`] when `args` cannot be serialized canonically or do not
    /// deserialize into `O::Args`.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime and an execution must start.
    pub fn subscribe<O, A>(
        &self,
        operation: &Arc<O>,
        args: &A,
        options: SubscriptionOptions,
    ) -> Result<Subscription<O>, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        let snapshot = self.inner.registry.snapshot(operation, args)?;
        let mut channels = self.inner.channels.lock();

        let options = match channels.get(&snapshot.signature).map(Arc::clone) {
            Some(existing) => match existing.as_any().downcast::<Channel<O>>() {
                Ok(channel) => match channel.subscribe(options) {
                    Ok(subscription) => return Ok(subscription),
                    // Closed, eviction pending: replaced below.
                    Err(options) => options,
                },
                Err(_) => options,
            },
            None => options,
        };

        let channel = Channel::new(ChannelParams {
            args: snapshot.decode(&**operation)?,
            signature: snapshot.signature.clone(),
            operation: Arc::clone(operation),
            bus: self.inner.bus.clone(),
            config: Arc::clone(&self.inner.config),
            manager: Arc::downgrade(&self.inner),
        });
        tracing::debug!(signature = %snapshot.signature, operation = operation.name(), "channel created");
        self.inner.bus.publish(
            Event::new(EventKind::ChannelCreated)
                .with_signature(snapshot.signature.to_string())
                .with_operation(operation.name()),
        );
        channels.insert(snapshot.signature, Arc::clone(&channel) as Arc<dyn ChannelControl>);

        Ok(channel.open(options))
    }

    /// Refreshes the channel of `(operation, args)`, if one exists.
    ///
    /// Silently does nothing when nobody is subscribed to that signature.
    pub fn refresh<O, A>(
        &self,
        operation: &Arc<O>,
        args: &A,
        options: RefreshOptions,
    ) -> Result<(), SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        let signature = self.inner.registry.signature(operation, args)?;
        let channel = self.inner.channels.lock().get(&signature).map(Arc::clone);
        if let Some(channel) = channel {
            channel.refresh(options);
        }
        Ok(())
    }

    /// Pauses every existing channel; executions requested meanwhile are marked `late`.
    pub fn pause(&self) {
        for channel in self.snapshot_channels() {
            channel.pause();
        }
    }

    /// Resumes every existing channel, running late executions immediately.
    pub fn resume(&self) {
        for channel in self.snapshot_channels() {
            channel.resume();
        }
    }

    /// Returns `true` if a channel exists for `(operation, args)`.
    pub fn contains<O, A>(&self, operation: &Arc<O>, args: &A) -> Result<bool, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        let signature = self.inner.registry.signature(operation, args)?;
        Ok(self.inner.channels.lock().contains_key(&signature))
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.inner.channels.lock().len()
    }

    /// Number of subscribers across all live channels.
    pub fn subscriber_count(&self) -> usize {
        self.snapshot_channels()
            .iter()
            .map(|c| c.subscriber_count())
            .sum()
    }

    /// Computes the signature `(operation, args)` would be deduplicated under.
    pub fn signature<O, A>(&self, operation: &Arc<O>, args: &A) -> Result<Signature, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        self.inner.registry.signature(operation, args)
    }

    /// Signatures of all live channels, sorted.
    pub fn signatures(&self) -> Vec<Signature> {
        let mut out: Vec<_> = self
            .snapshot_channels()
            .iter()
            .map(|c| c.signature().clone())
            .collect();
        out.sort();
        out
    }

    /// Creates a receiver for subsequent lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    fn snapshot_channels(&self) -> Vec<Arc<dyn ChannelControl>> {
        self.inner.channels.lock().values().cloned().collect()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("channels", &self.channel_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
