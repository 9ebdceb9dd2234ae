//! # Example: Polling with coalesced intervals
//!
//! Two subscribers poll the same endpoint at 300ms and 700ms. The channel polls
//! at the faster cadence until that subscriber leaves, pauses for a while, then
//! resumes and runs the late execution at once.
//!
//! Run with: `cargo run --example polling --features logging`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fetchvisor::{
    ExecutionScope, LogWriter, Manager, ManagerConfig, Observer, OperationFn, SubscriptionOptions,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let observers: Vec<Arc<dyn Observer>> = vec![Arc::new(LogWriter::new())];
    let manager = Manager::builder(ManagerConfig::default())
        .with_observers(observers)
        .build();

    let ticks = Arc::new(AtomicU64::new(0));
    let source = ticks.clone();
    let price = OperationFn::arc("price", move |(symbol,): (String,), _scope: ExecutionScope| {
        let source = source.clone();
        async move {
            let tick = source.fetch_add(1, Ordering::SeqCst);
            if tick == 5 {
                anyhow::bail!("quote service hiccup");
            }
            Ok(format!("{symbol}@{}", 100 + tick))
        }
    });

    let dashboard = manager.subscribe(
        &price,
        &("ACME",),
        SubscriptionOptions::new()
            .with_interval(Duration::from_millis(700))
            .with_on_error(|e| eprintln!("dashboard saw: {}", e.as_message())),
    )?;
    let ticker = manager.subscribe(
        &price,
        &("ACME",),
        SubscriptionOptions::new().with_interval(Duration::from_millis(300)),
    )?;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    println!("fast phase: {:?}", ticker.response());

    ticker.unsubscribe();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    println!("slow phase: {:?} errored={}", dashboard.response(), dashboard.errored());

    // Polling stopped on error; a manual refresh restarts it.
    if dashboard.errored() {
        dashboard.refresh();
    }

    manager.pause();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    println!("paused: late={}", dashboard.late());

    manager.resume();
    let state = dashboard.future().await?;
    println!("resumed: {:?}", state.response);

    dashboard.unsubscribe();
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
