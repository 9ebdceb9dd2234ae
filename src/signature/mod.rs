//! # Signatures and argument snapshots.
//!
//! - [`SignatureRegistry`] numbers operations by reference identity.
//! - [`Signature`] is the channel key derived from an operation and its arguments.
//! - [`Live`] is a shared cell that serializes as its current value.

mod canonical;
mod live;
mod registry;

pub use live::Live;
pub use registry::{OperationId, Signature, SignatureRegistry};
