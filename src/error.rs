//! Error types used by fetchvisor.
//!
//! This module defines three error enums:
//!
//! - [`SignatureError`] arguments could not be turned into a channel signature.
//! - [`ExecutionError`] an operation failed or panicked while executing.
//! - [`ResolveError`] a [`Subscription::future`](crate::Subscription::future) awaiter was rejected.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::sync::Arc;

use thiserror::Error;

/// # Errors produced while computing a channel signature.
///
/// Raised synchronously by [`Manager::subscribe`](crate::Manager::subscribe) and
/// [`Manager::refresh`](crate::Manager::refresh); never deferred into an execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Arguments cannot be canonically serialized (unsupported value or cyclic live cell).
    #[error("arguments cannot be serialized: {reason}")]
    Unserializable {
        /// The serializer's message.
        reason: String,
    },

    /// Arguments serialize, but their plain snapshot does not fit the operation's parameters.
    #[error("arguments do not match operation `{operation}`: {reason}")]
    Mismatch {
        /// Name of the operation.
        operation: String,
        /// The deserializer's message.
        reason: String,
    },
}

impl SignatureError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fetchvisor::SignatureError;
    ///
    /// let err = SignatureError::Unserializable { reason: "cyclic".into() };
    /// assert_eq!(err.as_label(), "signature_unserializable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SignatureError::Unserializable { .. } => "signature_unserializable",
            SignatureError::Mismatch { .. } => "signature_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SignatureError::Unserializable { reason } => format!("unserializable: {reason}"),
            SignatureError::Mismatch { operation, reason } => {
                format!("mismatch: operation={operation} {reason}")
            }
        }
    }
}

/// # Errors produced by operation execution.
///
/// Stored on the channel and fanned out to every subscription, so the type is
/// cheap to clone (the underlying error is shared).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    /// The operation returned an error.
    #[error("operation failed: {error}")]
    Failed {
        /// The error returned by the operation.
        error: Arc<anyhow::Error>,
    },

    /// The operation panicked; the panic was caught and converted.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ExecutionError {
    /// Wraps an error returned by an operation.
    pub fn failed(error: anyhow::Error) -> Self {
        ExecutionError::Failed {
            error: Arc::new(error),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutionError::Failed { .. } => "execution_failed",
            ExecutionError::Panicked { .. } => "execution_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ExecutionError::Failed { error } => format!("error: {error:#}"),
            ExecutionError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Attempts to downcast the operation's error to a concrete type.
    ///
    /// Returns `None` for panics or when the error is of another type.
    ///
    /// # Example
    /// ```
    /// use fetchvisor::ExecutionError;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("not found")]
    /// struct NotFound;
    ///
    /// let err = ExecutionError::failed(NotFound.into());
    /// assert!(err.downcast_ref::<NotFound>().is_some());
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            ExecutionError::Failed { error } => error.downcast_ref::<E>(),
            ExecutionError::Panicked { .. } => None,
        }
    }

    /// Returns `true` when both values carry the very same failure.
    pub(crate) fn same_as(&self, other: &ExecutionError) -> bool {
        match (self, other) {
            (ExecutionError::Failed { error: a }, ExecutionError::Failed { error: b }) => {
                Arc::ptr_eq(a, b)
            }
            (ExecutionError::Panicked { info: a }, ExecutionError::Panicked { info: b }) => a == b,
            _ => false,
        }
    }
}

/// # Errors returned by [`Subscription::future`](crate::Subscription::future).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The channel's current/next execution failed.
    #[error(transparent)]
    Failed(#[from] ExecutionError),

    /// The subscription was unsubscribed before the channel resolved.
    #[error("subscription aborted before resolution")]
    Aborted,
}

impl ResolveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolveError::Failed(e) => e.as_label(),
            ResolveError::Aborted => "resolve_aborted",
        }
    }

    /// Returns the execution error, if the rejection came from one.
    pub fn execution(&self) -> Option<&ExecutionError> {
        match self {
            ResolveError::Failed(e) => Some(e),
            ResolveError::Aborted => None,
        }
    }
}
