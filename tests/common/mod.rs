#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use fetchvisor::{ExecutionScope, Operation, OperationFn};

pub const MS: Duration = Duration::from_millis(1);

/// Returns how many times the operation has been called so far.
pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Counts invocations and answers with the running count.
pub fn counting(counter: Arc<AtomicUsize>) -> Arc<impl Operation<Args = (u32,), Output = usize>> {
    OperationFn::arc("counting", move |(_n,): (u32,), _s: ExecutionScope| {
        let counter = counter.clone();
        async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
    })
}

/// Like [`counting`], but each call takes `work` to complete.
pub fn slow_counting(
    counter: Arc<AtomicUsize>,
    work: Duration,
) -> Arc<impl Operation<Args = (u32,), Output = usize>> {
    OperationFn::arc("slow_counting", move |(_n,): (u32,), _s: ExecutionScope| {
        let counter = counter.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(work).await;
            Ok(n)
        }
    })
}

/// Fails while `failing` is set; counts every call.
pub fn flaky(
    counter: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
) -> Arc<impl Operation<Args = (u32,), Output = usize>> {
    OperationFn::arc("flaky", move |(_n,): (u32,), _s: ExecutionScope| {
        let counter = counter.clone();
        let failing = failing.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if failing.load(Ordering::SeqCst) {
                anyhow::bail!("upstream unavailable (call {n})");
            }
            Ok(n)
        }
    })
}

/// `f(n) = n == 1`.
pub fn is_one() -> Arc<impl Operation<Args = (u32,), Output = bool>> {
    OperationFn::arc("is_one", |(n,): (u32,), _s: ExecutionScope| async move { Ok(n == 1) })
}
