use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::ManagerConfig,
        manager::{Manager, ManagerInner},
    },
    events::Bus,
    observers::{Observer, ObserverSet},
};

/// Builder for constructing a [`Manager`] with optional features.
pub struct ManagerBuilder {
    cfg: ManagerConfig,
    observers: Vec<Arc<dyn Observer>>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ManagerConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets event observers.
    ///
    /// Observers receive lifecycle events (channels, subscriptions, executions)
    /// through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observer>>) -> Self {
        self.observers = observers;
        self
    }

    /// Builds the manager.
    ///
    /// Without observers nothing is spawned and events go nowhere.
    ///
    /// # Panics
    /// With observers, panics when called outside a Tokio runtime.
    pub fn build(self) -> Manager {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        if !self.observers.is_empty() {
            let set = ObserverSet::new(self.observers, bus.clone());
            observer_listener(&bus, set, token.clone());
        }

        Manager::from_inner(Arc::new(ManagerInner::new(self.cfg, bus, token)))
    }
}

/// Forwards bus events to the observer set until the manager is dropped.
fn observer_listener(bus: &Bus, set: ObserverSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(ev) => set.emit_arc(Arc::new(ev)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "observer listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        set.shutdown().await;
    });
}
