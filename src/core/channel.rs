//! # Channel: shared execution state for one signature.
//!
//! A [`Channel`] owns everything the subscriptions of one signature share:
//! the mirrored [`SubscriptionState`], the subscriber map, the polling
//! [`Scheduler`] and the current [`ExecutionScope`].
//!
//! ## Architecture
//! ```text
//! Manager::subscribe ──► Channel::subscribe ──► attach
//!                                                ├─► execute (first subscriber)
//!                                                └─► rearm timer
//!
//! refresh / timer / resume ──► execute
//!                               ├─ loading  ─► AdmissionPolicy (queue or drop)
//!                               ├─ paused   ─► late = true
//!                               └─ otherwise:
//!                                    dispose previous scope, loading = true, rearm, fan out
//!                                    spawn run_once(...) ──► complete(outcome)
//!                                                             ├─ Ok  ─► response, rearm
//!                                                             ├─ Err ─► error, stop timer, on_error
//!                                                             └─ fan out, run queued refresh (or stay late if paused)
//!
//! Subscription::unsubscribe ──► Channel::unsubscribe
//!                                 ├─ others left ─► rearm
//!                                 └─ last one    ─► close, dispose scope, Manager::evict
//! ```
//!
//! ## Rules
//! - One `parking_lot::Mutex` guards the state; it is never held across `.await`.
//! - User code (`on_error` callbacks, scope cleanups) and eviction run after
//!   the lock is released.
//! - At most one execution is in flight.
//! - A closed channel is never mutated again; late completions are discarded.
//! - Every subscriber gets its own `watch` sender; identical snapshots do not
//!   wake receivers.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::ManagerConfig,
        manager::ManagerInner,
        runner::run_once,
        scheduler::{Scheduler, effective_interval},
    },
    error::ExecutionError,
    events::{Bus, Event, EventKind},
    observers::panic_message,
    operations::{ExecutionScope, Operation},
    policies::AdmissionPolicy,
    signature::Signature,
    subscription::{
        ErrorCallback, RefreshOptions, Subscription, SubscriptionId, SubscriptionOptions,
        SubscriptionState,
    },
};

/// Type-erased view of a channel, as stored by the manager.
pub(crate) trait ChannelControl: Send + Sync + 'static {
    fn signature(&self) -> &Signature;
    fn pause(&self);
    fn resume(&self);
    fn refresh(&self, options: RefreshOptions);
    fn subscriber_count(&self) -> usize;
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Construction parameters for a channel.
pub(crate) struct ChannelParams<O: Operation> {
    pub signature: Signature,
    pub operation: Arc<O>,
    pub args: O::Args,
    pub bus: Bus,
    pub config: Arc<ManagerConfig>,
    pub manager: Weak<ManagerInner>,
}

struct Subscriber<R> {
    options: SubscriptionOptions,
    tx: watch::Sender<SubscriptionState<R>>,
}

struct ChannelState<R> {
    view: SubscriptionState<R>,
    subscribers: HashMap<SubscriptionId, Subscriber<R>>,
    scheduler: Scheduler,
    scope: ExecutionScope,
    /// A refresh arrived while loading (admission `Queue`).
    queued: bool,
    /// Last subscriber left; the manager no longer hands this channel out.
    closed: bool,
}

/// Work collected under the lock and performed after it is released.
#[derive(Default)]
struct Effects {
    dispose: Vec<ExecutionScope>,
    on_error: Vec<(ErrorCallback, ExecutionError)>,
}

impl Effects {
    fn run(self, label: &str) {
        for scope in self.dispose {
            scope.dispose();
        }
        for (callback, error) in self.on_error {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(&error))) {
                let info = panic_message(panic.as_ref());
                tracing::warn!(signature = %label, %info, "on_error callback panicked");
            }
        }
    }
}

/// Execution state shared by every subscription of one signature.
pub(crate) struct Channel<O: Operation> {
    signature: Signature,
    label: Arc<str>,
    name: Arc<str>,
    operation: Arc<O>,
    args: O::Args,
    bus: Bus,
    config: Arc<ManagerConfig>,
    manager: Weak<ManagerInner>,
    this: Weak<Self>,
    state: Mutex<ChannelState<O::Output>>,
}

impl<O: Operation> Channel<O> {
    /// Creates an empty, unexecuted channel.
    pub(crate) fn new(params: ChannelParams<O>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            label: Arc::from(params.signature.to_string()),
            name: Arc::from(params.operation.name()),
            signature: params.signature,
            operation: params.operation,
            args: params.args,
            bus: params.bus,
            config: params.config,
            manager: params.manager,
            this: this.clone(),
            state: Mutex::new(ChannelState {
                view: SubscriptionState::default(),
                subscribers: HashMap::new(),
                scheduler: Scheduler::new(),
                scope: ExecutionScope::new(),
                queued: false,
                closed: false,
            }),
        })
    }

    /// Attaches a subscriber; hands the options back if the channel is closed.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        options: SubscriptionOptions,
    ) -> Result<Subscription<O>, SubscriptionOptions> {
        let mut fx = Effects::default();
        let subscription = {
            let mut st = self.state.lock();
            if st.closed {
                return Err(options);
            }
            self.attach_locked(&mut st, options, &mut fx)
        };
        fx.run(&self.label);
        Ok(subscription)
    }

    /// Attaches the first subscriber of a fresh channel.
    pub(crate) fn open(self: &Arc<Self>, options: SubscriptionOptions) -> Subscription<O> {
        let mut fx = Effects::default();
        let subscription = {
            let mut st = self.state.lock();
            self.attach_locked(&mut st, options, &mut fx)
        };
        fx.run(&self.label);
        subscription
    }

    /// Detaches a subscriber. Returns `false` if it was not attached.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut fx = Effects::default();
        let (removed, last) = {
            let mut st = self.state.lock();
            let Some(removed) = st.subscribers.remove(&id) else {
                return false;
            };

            let last = st.subscribers.is_empty();
            if last {
                st.closed = true;
                st.queued = false;
                st.scheduler.clear();
                fx.dispose.push(st.scope.clone());
            } else {
                self.rearm_locked(&mut st, Instant::now());
            }
            self.bus.publish(
                self.event(EventKind::SubscriptionRemoved)
                    .with_subscription(id.get())
                    .with_interval(self.interval_locked(&st)),
            );
            (removed, last)
        };
        // Dropped here: the options may own user closures.
        drop(removed);
        fx.run(&self.label);

        if last {
            tracing::debug!(signature = %self.label, "last subscriber left, evicting channel");
            if let Some(manager) = self.manager.upgrade() {
                manager.evict(&self.signature, self as *const Self as *const ());
            }
            self.bus.publish(self.event(EventKind::ChannelRemoved));
        }
        true
    }

    /// Re-executes unless debounced by `options.max_refresh_rate`.
    pub(crate) fn refresh(&self, options: RefreshOptions) {
        let mut fx = Effects::default();
        {
            let mut st = self.state.lock();
            if st.closed {
                return;
            }
            self.refresh_locked(&mut st, options, &mut fx);
        }
        fx.run(&self.label);
    }

    /// Defers executions until [`Channel::resume`].
    pub(crate) fn pause(&self) {
        let mut st = self.state.lock();
        if st.closed || st.view.paused {
            return;
        }
        st.view.paused = true;
        self.fan_out(&st);
        self.bus.publish(self.event(EventKind::Paused));
    }

    /// Lifts a pause; runs the deferred execution if one was requested.
    pub(crate) fn resume(&self) {
        let mut fx = Effects::default();
        {
            let mut st = self.state.lock();
            if st.closed || !st.view.paused {
                return;
            }
            st.view.paused = false;
            self.bus.publish(self.event(EventKind::Resumed));
            if st.view.late {
                self.execute_locked(&mut st, &mut fx);
            }
            self.fan_out(&st);
        }
        fx.run(&self.label);
    }

    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn operation_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Effective polling interval, if any subscriber polls.
    #[cfg(test)]
    pub(crate) fn interval(&self) -> Option<Duration> {
        self.interval_locked(&self.state.lock())
    }

    /// Returns `true` while a polling timer is armed.
    #[cfg(test)]
    pub(crate) fn is_polling(&self) -> bool {
        self.state.lock().scheduler.is_armed()
    }

    fn attach_locked(
        self: &Arc<Self>,
        st: &mut ChannelState<O::Output>,
        options: SubscriptionOptions,
        fx: &mut Effects,
    ) -> Subscription<O> {
        let id = SubscriptionId::next();
        let lifecycle = options.lifecycle;
        let (tx, rx) = watch::channel(st.view.clone());
        st.subscribers.insert(id, Subscriber { options, tx });

        self.bus.publish(
            self.event(EventKind::SubscriptionCreated)
                .with_subscription(id.get())
                .with_interval(self.interval_locked(st)),
        );
        if !st.view.executed && !st.view.loading {
            self.execute_locked(st, fx);
        }
        self.rearm_locked(st, Instant::now());

        Subscription::new(id, Arc::clone(self), rx, lifecycle)
    }

    fn refresh_locked(
        &self,
        st: &mut ChannelState<O::Output>,
        options: RefreshOptions,
        fx: &mut Effects,
    ) {
        if let Some(elapsed) = st.scheduler.since_last(Instant::now()) {
            if elapsed < options.max_refresh_rate {
                self.bus
                    .publish(self.event(EventKind::RefreshDebounced).with_delay(elapsed));
                return;
            }
        }

        self.bus.publish(self.event(EventKind::RefreshRequested));
        self.execute_locked(st, fx);
    }

    /// Starts an execution, or records why it cannot start yet.
    ///
    /// The previous scope is disposed only when a new execution actually begins.
    fn execute_locked(&self, st: &mut ChannelState<O::Output>, fx: &mut Effects) {
        if st.view.loading {
            let policy = self.config.admission;
            if policy == AdmissionPolicy::Queue {
                st.queued = true;
                // Kept through completion so resume still runs it.
                if st.view.paused {
                    self.mark_late_locked(st);
                }
            }
            self.bus
                .publish(self.event(EventKind::RefreshQueued).with_reason(policy.as_label()));
            return;
        }

        if st.view.paused {
            self.mark_late_locked(st);
            return;
        }

        fx.dispose.push(std::mem::take(&mut st.scope));
        let now = Instant::now();
        st.view.loading = true;
        st.scheduler.mark_execution(now);
        self.rearm_locked(st, now);
        self.fan_out(st);
        self.bus.publish(self.event(EventKind::ExecutionStarted));

        let operation = Arc::clone(&self.operation);
        let args = self.args.clone();
        let scope = st.scope.clone();
        let this = self.this.clone();
        tokio::spawn(async move {
            let outcome = run_once(&*operation, args, scope).await;
            if let Some(channel) = this.upgrade() {
                channel.complete(outcome);
            }
        });
    }

    fn complete(&self, outcome: Result<O::Output, ExecutionError>) {
        let mut fx = Effects::default();
        {
            let mut st = self.state.lock();
            if st.closed {
                return;
            }

            match outcome {
                Ok(value) => {
                    let unchanged = st.view.response.as_ref() == Some(&value);
                    if !unchanged {
                        st.view.response = Some(value);
                    }
                    st.view.errored = false;
                    st.view.error = None;
                    self.rearm_locked(&mut st, Instant::now());

                    let ev = self.event(EventKind::ExecutionSucceeded);
                    self.bus
                        .publish(if unchanged { ev.with_reason("unchanged") } else { ev });
                }
                Err(error) => {
                    tracing::warn!(
                        signature = %self.label,
                        operation = %self.name,
                        error = %error.as_message(),
                        "execution failed"
                    );
                    st.view.errored = true;
                    st.view.error = Some(error.clone());
                    st.scheduler.clear();
                    fx.on_error.extend(
                        st.subscribers
                            .values()
                            .filter_map(|s| s.options.on_error.clone())
                            .map(|callback| (callback, error.clone())),
                    );
                    self.bus.publish(
                        self.event(EventKind::ExecutionFailed)
                            .with_reason(error.as_message()),
                    );
                }
            }

            let queued = std::mem::take(&mut st.queued);
            st.view.executed = true;
            st.view.loading = false;
            st.view.late = queued && st.view.paused;
            self.fan_out(&st);

            if queued && !st.view.paused {
                self.refresh_locked(&mut st, RefreshOptions::default(), &mut fx);
            }
        }
        fx.run(&self.label);
    }

    fn on_timer(&self, token: &CancellationToken) {
        let mut fx = Effects::default();
        {
            let mut st = self.state.lock();
            if st.closed || !st.scheduler.fired(token) {
                return;
            }
            self.refresh_locked(&mut st, RefreshOptions::default(), &mut fx);
        }
        fx.run(&self.label);
    }

    fn mark_late_locked(&self, st: &mut ChannelState<O::Output>) {
        if !st.view.late {
            st.view.late = true;
            self.fan_out(st);
            self.bus.publish(self.event(EventKind::LateMarked));
        }
    }

    fn rearm_locked(&self, st: &mut ChannelState<O::Output>, now: Instant) {
        let interval = self.interval_locked(st);
        let Some((token, delay)) = st.scheduler.rearm(interval, st.view.errored, now) else {
            return;
        };
        // Unsubscribing from a drop may happen outside a runtime.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(signature = %self.label, "no runtime, polling timer not armed");
            st.scheduler.clear();
            return;
        };

        let this = self.this.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(channel) = this.upgrade() {
                        channel.on_timer(&token);
                    }
                }
            }
        });
    }

    fn interval_locked(&self, st: &ChannelState<O::Output>) -> Option<Duration> {
        effective_interval(
            st.subscribers
                .values()
                .filter_map(|s| s.options.polling_interval()),
        )
        .map(|interval| self.config.clamp_interval(interval))
    }

    fn fan_out(&self, st: &ChannelState<O::Output>) {
        for subscriber in st.subscribers.values() {
            subscriber.tx.send_if_modified(|current| {
                if current.same_as(&st.view) {
                    return false;
                }
                *current = st.view.clone();
                true
            });
        }
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_signature(Arc::clone(&self.label))
            .with_operation(Arc::clone(&self.name))
    }
}

impl<O: Operation> ChannelControl for Channel<O> {
    fn signature(&self) -> &Signature {
        Channel::signature(self)
    }

    fn pause(&self) {
        Channel::pause(self)
    }

    fn resume(&self) {
        Channel::resume(self)
    }

    fn refresh(&self, options: RefreshOptions) {
        Channel::refresh(self, options)
    }

    fn subscriber_count(&self) -> usize {
        Channel::subscriber_count(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OperationFn, signature::SignatureRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MS: Duration = Duration::from_millis(1);

    fn channel<O: Operation<Args = ()>>(op: Arc<O>, config: ManagerConfig) -> Arc<Channel<O>> {
        let registry = SignatureRegistry::new();
        Channel::new(ChannelParams {
            signature: registry.signature(&op, &()).expect("signature"),
            operation: op,
            args: (),
            bus: Bus::new(16),
            config: Arc::new(config),
            manager: Weak::new(),
        })
    }

    fn counting(calls: Arc<AtomicUsize>, delay: Duration) -> Arc<impl Operation<Args = (), Output = usize>> {
        OperationFn::arc("counting", move |_: (), _s: ExecutionScope| {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Ok(n)
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_follows_subscribers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ch = channel(counting(calls, Duration::ZERO), ManagerConfig::default());

        let slow = ch
            .subscribe(SubscriptionOptions::new().with_interval(20 * MS))
            .expect("open");
        let fast = ch
            .subscribe(SubscriptionOptions::new().with_interval(10 * MS))
            .expect("open");
        assert_eq!(ch.interval(), Some(10 * MS));
        assert!(ch.is_polling());

        fast.unsubscribe();
        assert_eq!(ch.interval(), Some(20 * MS));

        slow.unsubscribe();
        assert_eq!(ch.interval(), None);
        assert!(!ch.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_rejects_subscribers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ch = channel(counting(calls, Duration::ZERO), ManagerConfig::default());

        let sub = ch.subscribe(SubscriptionOptions::new()).expect("open");
        assert!(ch.unsubscribe(sub.id()));
        assert!(!ch.unsubscribe(sub.id()));
        assert!(ch.subscribe(SubscriptionOptions::new()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_interval_floor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ManagerConfig {
            min_refresh_interval: 50 * MS,
            ..ManagerConfig::default()
        };
        let ch = channel(counting(calls, Duration::ZERO), config);
        let _sub = ch
            .subscribe(SubscriptionOptions::new().with_interval(MS))
            .expect("open");
        assert_eq!(ch.interval(), Some(50 * MS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_policies() {
        for (policy, expected) in [(AdmissionPolicy::Queue, 2), (AdmissionPolicy::DropIfLoading, 1)] {
            let calls = Arc::new(AtomicUsize::new(0));
            let config = ManagerConfig {
                admission: policy,
                ..ManagerConfig::default()
            };
            let ch = channel(counting(calls.clone(), 10 * MS), config);
            let sub = ch.subscribe(SubscriptionOptions::new()).expect("open");

            // Both arrive while the first execution is loading.
            ch.refresh(RefreshOptions::default());
            ch.refresh(RefreshOptions::default());
            tokio::time::sleep(100 * MS).await;

            assert_eq!(calls.load(Ordering::SeqCst), expected, "{policy:?}");
            assert_eq!(sub.response(), Some(expected));
            sub.unsubscribe();
        }
    }
}
