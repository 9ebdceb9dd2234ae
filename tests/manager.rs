mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use common::{MS, calls, counting, is_one};
use fetchvisor::{
    Lifecycle, Live, Manager, RefreshOptions, SignatureError, SubscriptionOptions,
    SubscriptionScope,
};

#[tokio::test(start_paused = true)]
async fn identical_subscriptions_share_one_execution() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = counting(counter.clone());
    let manager = Manager::default();

    let a = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    let b = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    assert_eq!(a.signature(), b.signature());
    assert_ne!(a.id(), b.id());
    assert_eq!(manager.channel_count(), 1);
    assert_eq!(manager.subscriber_count(), 2);

    a.future().await.expect("resolved");
    b.future().await.expect("resolved");
    assert_eq!(calls(&counter), 1);
    assert_eq!(a.response(), Some(1));
    assert_eq!(b.response(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn different_operation_references_never_share() {
    let counter = Arc::new(AtomicUsize::new(0));
    let first = counting(counter.clone());
    let second = counting(counter.clone());
    let manager = Manager::default();

    let a = manager.subscribe(&first, &(1,), SubscriptionOptions::new()).expect("subscribe");
    let b = manager.subscribe(&second, &(1,), SubscriptionOptions::new()).expect("subscribe");
    assert_ne!(a.signature(), b.signature());
    assert_eq!(manager.channel_count(), 2);

    a.future().await.expect("resolved");
    b.future().await.expect("resolved");
    assert_eq!(calls(&counter), 2);
}

#[tokio::test(start_paused = true)]
async fn is_one_scenario_gets_independent_channels() {
    let op = is_one();
    let manager = Manager::default();

    let one = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    let zero = manager.subscribe(&op, &(0,), SubscriptionOptions::new()).expect("subscribe");

    assert_eq!(one.signature().to_string(), "0-[1]");
    assert_eq!(zero.signature().to_string(), "0-[0]");
    assert_eq!(manager.channel_count(), 2);

    let one = one.future().await.expect("resolved");
    let zero = zero.future().await.expect("resolved");
    assert_eq!(one.response, Some(true));
    assert_eq!(zero.response, Some(false));
}

#[tokio::test(start_paused = true)]
async fn last_unsubscribe_tears_down_and_resubscribe_starts_fresh() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = counting(counter.clone());
    let manager = Manager::default();

    let first = manager
        .subscribe(&op, &(1,), SubscriptionOptions::new().with_interval(10 * MS))
        .expect("subscribe");
    first.future().await.expect("resolved");
    first.unsubscribe();
    first.unsubscribe();

    assert!(!first.is_subscribed());
    assert_eq!(manager.channel_count(), 0);
    assert!(!manager.contains(&op, &(1,)).expect("signature"));

    // No timer survives the teardown.
    tokio::time::sleep(100 * MS).await;
    assert_eq!(calls(&counter), 1);

    let second = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    assert!(!second.executed());
    assert_eq!(second.future().await.expect("resolved").response, Some(2));
    assert!(manager.contains(&op, &(1,)).expect("signature"));
}

#[tokio::test(start_paused = true)]
async fn manager_refresh_without_channel_is_a_no_op() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = counting(counter.clone());
    let manager = Manager::default();

    manager.refresh(&op, &(9,), RefreshOptions::default()).expect("signature");
    tokio::time::sleep(10 * MS).await;
    assert_eq!(calls(&counter), 0);
    assert_eq!(manager.channel_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn manager_refresh_reaches_existing_channel() {
    let counter = Arc::new(AtomicUsize::new(0));
    let op = counting(counter.clone());
    let manager = Manager::default();

    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    sub.future().await.expect("resolved");

    manager.refresh(&op, &(1,), RefreshOptions::default()).expect("signature");
    tokio::time::sleep(MS).await;
    assert_eq!(calls(&counter), 2);
    assert_eq!(sub.response(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn signature_errors_are_synchronous() {
    let op = is_one();
    let manager = Manager::default();

    let mut tuple_keys = HashMap::new();
    tuple_keys.insert((1u8, 2u8), 3u8);
    let err = manager
        .subscribe(&op, &tuple_keys, SubscriptionOptions::new())
        .expect_err("map keys must be strings");
    assert!(matches!(err, SignatureError::Unserializable { .. }));

    let err = manager
        .subscribe(&op, &("one",), SubscriptionOptions::new())
        .expect_err("wrong parameter type");
    assert!(matches!(err, SignatureError::Mismatch { .. }));
    assert_eq!(manager.channel_count(), 0);

    assert!(manager.refresh(&op, &tuple_keys, RefreshOptions::default()).is_err());
}

#[tokio::test(start_paused = true)]
async fn live_arguments_are_snapshotted_per_subscribe() {
    let op = is_one();
    let manager = Manager::default();
    let n = Live::new(1u32);
    let args = (n.clone(),);

    let first = manager.subscribe(&op, &args, SubscriptionOptions::new()).expect("subscribe");
    n.set(0);
    let second = manager.subscribe(&op, &args, SubscriptionOptions::new()).expect("subscribe");

    assert_eq!(first.signature().args(), "[1]");
    assert_eq!(second.signature().args(), "[0]");
    assert_eq!(first.future().await.expect("resolved").response, Some(true));
    assert_eq!(second.future().await.expect("resolved").response, Some(false));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_last_caller_handle_unsubscribes() {
    let op = is_one();
    let manager = Manager::default();

    let sub = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    let clone = sub.clone();
    drop(sub);
    assert_eq!(manager.channel_count(), 1);

    drop(clone);
    assert_eq!(manager.channel_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn extended_subscriptions_survive_handle_drops() {
    let op = is_one();
    let manager = Manager::default();

    let sub = manager
        .subscribe(
            &op,
            &(1,),
            SubscriptionOptions::new().with_lifecycle(Lifecycle::Extended),
        )
        .expect("subscribe");
    let keep = sub.clone();
    drop(sub);
    assert_eq!(manager.channel_count(), 1);

    keep.unsubscribe();
    assert_eq!(manager.channel_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn subscription_scope_releases_everything() {
    let op = is_one();
    let manager = Manager::default();
    let scope = SubscriptionScope::new();

    let a = scope
        .subscribe(&manager, &op, &(1,), SubscriptionOptions::new())
        .expect("subscribe");
    let b = scope
        .subscribe(&manager, &op, &(0,), SubscriptionOptions::new())
        .expect("subscribe");
    assert_eq!(scope.len(), 2);
    assert_eq!(manager.signatures().len(), 2);

    scope.close();
    assert!(!a.is_subscribed());
    assert!(!b.is_subscribed());
    assert_eq!(manager.channel_count(), 0);

    // Tracking on a closed scope releases at once.
    let late = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    scope.track(&late);
    assert!(!late.is_subscribed());
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_apply_to_every_channel() {
    let op = is_one();
    let manager = Manager::default();
    let a = manager.subscribe(&op, &(1,), SubscriptionOptions::new()).expect("subscribe");
    let b = manager.subscribe(&op, &(0,), SubscriptionOptions::new()).expect("subscribe");

    manager.pause();
    assert!(a.paused() && b.paused());

    manager.resume();
    assert!(!a.paused() && !b.paused());
}
