//! # Function-backed operation (`OperationFn`)
//!
//! [`OperationFn`] wraps a closure `F: Fn(A, ExecutionScope) -> Fut`, producing
//! a fresh future per execution. Shared state across executions must be made
//! explicit with `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use fetchvisor::{ExecutionScope, Operation, OperationFn};
//!
//! let is_one = OperationFn::arc("is_one", |(n,): (u32,), _scope: ExecutionScope| async move {
//!     Ok(n == 1)
//! });
//!
//! assert_eq!(is_one.name(), "is_one");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::operations::{operation::Operation, scope::ExecutionScope};

/// Function-backed operation implementation.
pub struct OperationFn<F, A, R> {
    name: Cow<'static, str>,
    f: F,
    _types: PhantomData<fn(A) -> R>,
}

impl<F, A, R> OperationFn<F, A, R> {
    /// Creates a new function-backed operation.
    ///
    /// Prefer [`OperationFn::arc`]: operations are identified by their `Arc`.
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(A, ExecutionScope) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        Self {
            name: name.into(),
            f,
            _types: PhantomData,
        }
    }

    /// Creates the operation and returns it as a shared handle.
    pub fn arc<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(A, ExecutionScope) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<F, A, R> std::fmt::Debug for OperationFn<F, A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut, A, R> Operation for OperationFn<F, A, R>
where
    F: Fn(A, ExecutionScope) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    A: DeserializeOwned + Clone + Send + Sync + 'static,
    R: Clone + PartialEq + Send + Sync + 'static,
{
    type Args = A;
    type Output = R;

    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: A, scope: ExecutionScope) -> anyhow::Result<R> {
        (self.f)(args, scope).await
    }
}
