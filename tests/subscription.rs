mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{MS, calls, flaky, is_one, slow_counting};
use fetchvisor::{
    Event, EventKind, ExecutionScope, Manager, ManagerConfig, Observer, OperationFn,
    ResolveError, SubscriptionOptions,
};
use parking_lot::Mutex;

#[tokio::test(start_paused = true)]
async fn future_resolves_immediately_once_executed() {
    let op = is_one();
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");

    let first = sub.future().await.expect("resolved");
    let again = sub.future().await.expect("resolved");
    assert!(first.executed && again.executed);
    assert_eq!(again.response, Some(true));
}

#[tokio::test(start_paused = true)]
async fn future_rejects_with_the_execution_error() {
    #[derive(Debug, thiserror::Error)]
    #[error("gone")]
    struct Gone;

    let op = OperationFn::arc("gone", |_: (), _s: ExecutionScope| async move {
        Err::<u8, _>(anyhow::Error::new(Gone))
    });
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(), SubscriptionOptions::new()).expect("subscribe");

    match sub.future().await {
        Err(ResolveError::Failed(error)) => {
            assert!(error.downcast_ref::<Gone>().is_some());
            assert_eq!(error.as_label(), "execution_failed");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_operation_is_reported_not_propagated() {
    let op = OperationFn::arc("panics", |_: (), _s: ExecutionScope| async move {
        if true {
            panic!("bad input");
        }
        Ok(1u8)
    });
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(), SubscriptionOptions::new()).expect("subscribe");

    let err = sub.future().await.expect_err("panicked");
    assert_eq!(err.as_label(), "execution_panicked");
    assert!(!sub.loading());
}

#[tokio::test(start_paused = true)]
async fn future_is_aborted_by_unsubscribe() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = slow_counting(counter, Duration::from_secs(1));
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");

    let waiter = sub.clone();
    let pending = tokio::spawn(async move { waiter.future().await });
    tokio::time::sleep(MS).await;

    sub.unsubscribe();
    let outcome = pending.await.expect("join");
    assert!(matches!(outcome, Err(ResolveError::Aborted)));
    assert!(matches!(sub.future().await, Err(ResolveError::Aborted)));
}

#[tokio::test(start_paused = true)]
async fn on_error_reaches_every_subscriber() {
    let counter = Arc::new(AtomicUsize::new(0));
    let failing = Arc::new(AtomicBool::new(true));
    let op = flaky(counter.clone(), failing);
    let manager = Manager::default();

    let seen = Arc::new(AtomicUsize::new(0));
    let options = || {
        let seen = seen.clone();
        SubscriptionOptions::new().with_on_error(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    };

    let a = manager.subscribe(&op, &(1,), options()).expect("subscribe");
    let _b = manager.subscribe(&op, &(1,), options()).expect("subscribe");
    assert!(a.future().await.is_err());

    assert_eq!(calls(&counter), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_disposes_the_previous_execution_scope() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let hits = disposed.clone();
    let op = OperationFn::arc("scoped", move |_: (), scope: ExecutionScope| {
        let hits = hits.clone();
        async move {
            scope.on_dispose(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
            Ok(())
        }
    });
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(), SubscriptionOptions::new()).expect("subscribe");
    sub.future().await.expect("resolved");
    assert_eq!(disposed.load(Ordering::SeqCst), 0);

    sub.refresh();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    tokio::time::sleep(MS).await;

    // Teardown disposes the scope of the last execution.
    sub.unsubscribe();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn watch_receiver_sees_transitions() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = slow_counting(counter, 10 * MS);
    let manager = Manager::default();
    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");

    let mut rx = sub.watch();
    assert!(rx.borrow_and_update().loading);

    rx.changed().await.expect("sender alive");
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.response, Some(1));

    sub.unsubscribe();
    assert!(rx.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn lifecycle_events_are_published_in_order() {
    let op = is_one();
    let manager = Manager::default();
    let mut rx = manager.events();

    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    sub.future().await.expect("resolved");
    sub.unsubscribe();

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::ChannelCreated,
            EventKind::SubscriptionCreated,
            EventKind::ExecutionStarted,
            EventKind::ExecutionSucceeded,
            EventKind::SubscriptionRemoved,
            EventKind::ChannelRemoved,
        ]
    );
}

struct Recorder {
    seen: Mutex<Vec<(EventKind, Option<String>)>>,
}

#[async_trait]
impl Observer for Recorder {
    async fn on_event(&self, event: &Event) {
        self.seen
            .lock()
            .push((event.kind, event.signature.as_deref().map(str::to_owned)));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn observers_receive_events() {
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
    });
    let manager = Manager::builder(ManagerConfig::default())
        .with_observers(vec![recorder.clone() as Arc<dyn Observer>])
        .build();

    let op = is_one();
    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    sub.future().await.expect("resolved");
    tokio::time::sleep(10 * MS).await;

    let seen = recorder.seen.lock().clone();
    assert!(seen.contains(&(EventKind::ChannelCreated, Some("0-[1]".to_owned()))));
    assert!(seen.iter().any(|(kind, _)| *kind == EventKind::ExecutionSucceeded));
}
