//! # Execution-scoped side effects.
//!
//! Every execution of an operation receives an [`ExecutionScope`]. Work the
//! operation sets up that should not outlive "its" execution (background
//! listeners, child tasks, temporary cells) registers a cleanup with
//! [`ExecutionScope::on_dispose`] or watches [`ExecutionScope::token`].
//!
//! ## Rules
//! - A channel disposes the current scope when a `refresh()` begins a new
//!   execution, and when its last subscriber leaves.
//! - Disposal is **not** cancellation of the awaited call: the in-flight future
//!   keeps running, only its downstream effects are discarded.
//! - Cleanups run once, in reverse registration order, outside any channel lock.
//! - Registering a cleanup on an already disposed scope runs it immediately.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

type Cleanup = Box<dyn FnOnce() + Send + 'static>;

struct ScopeInner {
    token: CancellationToken,
    /// `None` once disposed.
    cleanups: Mutex<Option<Vec<Cleanup>>>,
}

/// Disposal token handed to each operation execution.
///
/// Cheap to clone; all clones observe the same disposal.
#[derive(Clone)]
pub struct ExecutionScope {
    inner: Arc<ScopeInner>,
}

impl ExecutionScope {
    /// Creates a fresh, live scope.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                token: CancellationToken::new(),
                cleanups: Mutex::new(Some(Vec::new())),
            }),
        }
    }

    /// Token cancelled when the scope is disposed.
    ///
    /// Use `token().child_token()` for tasks spawned from inside the operation.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Returns `true` once the scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the scope is disposed.
    pub async fn disposed(&self) {
        self.inner.token.cancelled().await
    }

    /// Registers a cleanup callback run when the scope is disposed.
    pub fn on_dispose(&self, f: impl FnOnce() + Send + 'static) {
        let mut guard = self.inner.cleanups.lock();
        match guard.as_mut() {
            Some(list) => list.push(Box::new(f)),
            None => {
                drop(guard);
                f();
            }
        }
    }

    /// Disposes the scope: cancels the token and runs pending cleanups.
    ///
    /// Idempotent.
    pub(crate) fn dispose(&self) {
        let pending = self.inner.cleanups.lock().take();
        self.inner.token.cancel();
        for cleanup in pending.into_iter().flatten().rev() {
            cleanup();
        }
    }
}

impl Default for ExecutionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionScope")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanups_run_once_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = ExecutionScope::new();
        for i in 0..3 {
            let order = order.clone();
            scope.on_dispose(move || order.lock().push(i));
        }

        scope.dispose();
        scope.dispose();

        assert!(scope.is_disposed());
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn test_late_registration_runs_immediately() {
        let scope = ExecutionScope::new();
        scope.dispose();

        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        scope.on_dispose(move || *flag.lock() = true);
        assert!(*ran.lock());
    }

    #[test]
    fn test_clones_share_disposal() {
        let scope = ExecutionScope::new();
        let child = scope.token().child_token();
        let copy = scope.clone();

        scope.dispose();
        assert!(copy.is_disposed());
        assert!(child.is_cancelled());
    }
}
