//! # Run a single execution of an operation.
//!
//! Executes one call of an [`Operation`] and converts every way it can end into
//! a `Result<Output, ExecutionError>`.
//!
//! ```text
//! operation.call(args, scope) → Ok(value)  → Ok(value)
//!                             → Err(error) → Err(ExecutionError::Failed)
//!                             → panic      → Err(ExecutionError::Panicked)
//! ```
//!
//! ## Rules
//! - A panicking operation never unwinds into the channel: the channel would
//!   otherwise stay `loading` forever.
//! - The scope is only handed over; disposing it is the channel's business.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    error::ExecutionError,
    observers::panic_message,
    operations::{ExecutionScope, Operation},
};

/// Executes `operation` once with `args`, catching panics.
pub(crate) async fn run_once<O: Operation + ?Sized>(
    operation: &O,
    args: O::Args,
    scope: ExecutionScope,
) -> Result<O::Output, ExecutionError> {
    match AssertUnwindSafe(operation.call(args, scope)).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ExecutionError::failed(error)),
        Err(panic) => Err(ExecutionError::Panicked {
            info: panic_message(panic.as_ref()),
        }),
    }
}
