//! # Example: Deduplicated subscriptions
//!
//! Three callers subscribe to the same user lookup; a fourth asks for another
//! user. The operation runs once per distinct argument list.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fetchvisor::{ExecutionScope, Manager, OperationFn, SubscriptionOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let manager = Manager::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let fetch_user = OperationFn::arc("fetch_user", move |(id,): (u64,), _scope: ExecutionScope| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(format!("user-{id}"))
        }
    });

    let callers = (0..3)
        .map(|_| manager.subscribe(&fetch_user, &(7,), SubscriptionOptions::new()))
        .collect::<Result<Vec<_>, _>>()?;
    let other = manager.subscribe(&fetch_user, &(8,), SubscriptionOptions::new())?;

    for sub in &callers {
        let state = sub.future().await?;
        println!("[{}] {} -> {:?}", sub.id(), sub.signature(), state.response);
    }
    println!("[{}] {} -> {:?}", other.id(), other.signature(), other.future().await?.response);

    println!(
        "channels={} executions={}",
        manager.channel_count(),
        calls.load(Ordering::SeqCst)
    );

    drop(callers);
    drop(other);
    println!("after drop: channels={}", manager.channel_count());
    Ok(())
}
