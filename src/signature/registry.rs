//! # Channel signatures.
//!
//! A [`Signature`] identifies a channel: the operation's identity plus the
//! canonical JSON of its arguments. Two subscriptions share a channel exactly
//! when their signatures are equal.
//!
//! ```text
//!   Arc<O> ──► SignatureRegistry ──► OperationId(3)
//!                                          │
//!   args ────► canonical JSON ───► "[1,{"a":2}]"
//!                                          │
//!                                          ▼
//!                               Signature "3-[1,{"a":2}]"
//! ```
//!
//! ## Rules
//! - Operations are identified by their `Arc` allocation, never by value or name.
//! - Ids are assigned on first sight, increase monotonically and are never reused.
//! - The registry only holds `Weak` references: it never keeps an operation alive.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::{error::SignatureError, operations::Operation, signature::canonical};

/// Identity assigned to an operation by a [`SignatureRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    /// Returns the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic channel key: operation identity plus canonical arguments.
///
/// Renders as `"{operation_id}-{canonical_json}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    operation: OperationId,
    args: Arc<str>,
}

impl Signature {
    /// Returns the operation part of the signature.
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    /// Returns the canonical JSON text of the arguments.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.operation, self.args)
    }
}

/// A signature together with the plain argument value it was computed from.
pub(crate) struct Snapshot {
    pub(crate) signature: Signature,
    pub(crate) plain: Value,
}

impl Snapshot {
    /// Converts the plain snapshot into the operation's parameter type.
    pub(crate) fn decode<O: Operation>(&self, operation: &O) -> Result<O::Args, SignatureError> {
        serde_json::from_value(self.plain.clone()).map_err(|e| SignatureError::Mismatch {
            operation: operation.name().to_owned(),
            reason: e.to_string(),
        })
    }
}

struct Entry {
    id: OperationId,
    /// Keeps the allocation (not the value) reserved, so the address key stays unique.
    _operation: Weak<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Table {
    next: u64,
    entries: HashMap<usize, Entry>,
}

/// Assigns stable ids to operations, keyed by reference identity.
///
/// Owned by a [`Manager`](crate::Manager); separate managers number their
/// operations independently.
#[derive(Default)]
pub struct SignatureRegistry {
    table: Mutex<Table>,
}

impl SignatureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `operation`, assigning the next free one on first sight.
    pub fn identify<O: Operation>(&self, operation: &Arc<O>) -> OperationId {
        let key = Arc::as_ptr(operation) as *const () as usize;
        let mut table = self.table.lock();
        if let Some(entry) = table.entries.get(&key) {
            return entry.id;
        }

        let id = OperationId(table.next);
        table.next += 1;
        let weak: Weak<O> = Arc::downgrade(operation);
        let weak: Weak<dyn Any + Send + Sync> = weak;
        table.entries.insert(
            key,
            Entry {
                id,
                _operation: weak,
            },
        );
        id
    }

    /// Computes the signature of `operation` called with `args`.
    pub fn signature<O, A>(&self, operation: &Arc<O>, args: &A) -> Result<Signature, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        self.snapshot(operation, args).map(|s| s.signature)
    }

    /// Number of operations seen so far.
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// Returns `true` if no operation has been identified yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn snapshot<O, A>(&self, operation: &Arc<O>, args: &A) -> Result<Snapshot, SignatureError>
    where
        O: Operation,
        A: Serialize + ?Sized,
    {
        // Serialize first: an unserializable call must not consume an id.
        let (plain, text) = canonical::snapshot(args)?;
        let signature = Signature {
            operation: self.identify(operation),
            args: Arc::from(text),
        };
        Ok(Snapshot { signature, plain })
    }
}

impl fmt::Debug for SignatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureRegistry")
            .field("operations", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecutionScope, Live, OperationFn};
    use serde_json::json;

    fn echo() -> Arc<impl Operation<Args = Value, Output = Value>> {
        OperationFn::arc("echo", |v: Value, _s: ExecutionScope| async move { Ok(v) })
    }

    #[test]
    fn test_same_reference_same_id() {
        let registry = SignatureRegistry::new();
        let op = echo();
        assert_eq!(registry.identify(&op), registry.identify(&op.clone()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_equal_behaviour_different_reference() {
        let registry = SignatureRegistry::new();
        let a = echo();
        let b = echo();
        let (ia, ib) = (registry.identify(&a), registry.identify(&b));
        assert_ne!(ia, ib);
        assert!(ib > ia);
    }

    #[test]
    fn test_signature_format() {
        let registry = SignatureRegistry::new();
        let op = echo();
        let sig = registry.signature(&op, &json!([1, {"b": 2, "a": 1}])).expect("ok");
        assert_eq!(sig.to_string(), r#"0-[1,{"a":1,"b":2}]"#);
        assert_eq!(sig.operation().get(), 0);
    }

    #[test]
    fn test_live_cells_render_current_value() {
        let registry = SignatureRegistry::new();
        let op = echo();
        let page = Live::new(1);
        let args = (page.clone(), "x");

        let first = registry.signature(&op, &args).expect("ok");
        page.set(2);
        let second = registry.signature(&op, &args).expect("ok");

        assert_ne!(first, second);
        assert_eq!(second.args(), r#"[2,"x"]"#);
    }

    #[test]
    fn test_unserializable_does_not_consume_id() {
        let registry = SignatureRegistry::new();
        let op = echo();
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), 3);
        assert!(registry.signature(&op, &bad).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_decode_mismatch() {
        let registry = SignatureRegistry::new();
        let op = OperationFn::arc("typed", |(n,): (u32,), _s: ExecutionScope| async move {
            Ok(n)
        });

        let ok = registry.snapshot(&op, &(7u32,)).expect("ok");
        assert_eq!(ok.decode(&*op).expect("fits"), (7,));

        let bad = registry.snapshot(&op, &("seven",)).expect("serializes");
        let err = bad.decode(&*op).expect_err("mismatch");
        assert_eq!(err.as_label(), "signature_mismatch");
    }
}
