//! # Operation abstraction.
//!
//! This module defines the [`Operation`] trait: an async, named unit of work
//! whose executions are deduplicated and shared by a [`Manager`](crate::Manager).
//!
//! Operations are shared as `Arc<O>` and identified **by reference**: two
//! subscriptions dedupe only when they pass the same `Arc` allocation and equal
//! arguments. Create each operation once (at startup) and clone the `Arc`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::operations::scope::ExecutionScope;

/// # Asynchronous fetch operation.
///
/// `Args` is the plain parameter type the operation is called with; it is
/// deserialized from the canonical argument snapshot, so callers may pass any
/// value serializing to the same shape (for example with [`Live`](crate::Live)
/// cells in place of plain values).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use fetchvisor::{ExecutionScope, Operation};
///
/// struct FetchUser;
///
/// #[async_trait]
/// impl Operation for FetchUser {
///     type Args = (u64,);
///     type Output = String;
///
///     fn name(&self) -> &str { "fetch_user" }
///
///     async fn call(&self, args: (u64,), _scope: ExecutionScope) -> anyhow::Result<String> {
///         Ok(format!("user-{}", args.0))
///     }
/// }
/// ```
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Plain parameters.
    type Args: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Successful result, mirrored into every subscription.
    ///
    /// `PartialEq` lets a channel skip waking subscribers when a refresh
    /// returns an unchanged value.
    type Output: Clone + PartialEq + Send + Sync + 'static;

    /// Returns a stable, human-readable name (used in events and logs).
    fn name(&self) -> &str;

    /// Executes the operation once.
    ///
    /// Side effects that must not outlive this execution should be tied to `scope`.
    async fn call(&self, args: Self::Args, scope: ExecutionScope) -> anyhow::Result<Self::Output>;
}
