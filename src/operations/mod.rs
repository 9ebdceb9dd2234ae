//! # Operation abstractions.
//!
//! This module provides the operation-related types:
//! - [`Operation`] trait for async fetch operations
//! - [`OperationFn`] closure-backed implementation
//! - [`ExecutionScope`] per-execution disposal token

mod operation;
mod operation_fn;
mod scope;

pub use operation::Operation;
pub use operation_fn::OperationFn;
pub use scope::ExecutionScope;
