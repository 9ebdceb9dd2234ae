//! # Live argument cells.
//!
//! [`Live<T>`] is a shared, externally mutable cell. When it appears inside
//! subscription arguments it serializes as its **current** value, so the
//! signature and the operation's parameters always see plain data.
//!
//! ```rust
//! use fetchvisor::Live;
//!
//! let page = Live::new(1u32);
//! let args = (page.clone(), "users");
//! assert_eq!(serde_json::to_string(&args).unwrap(), r#"[1,"users"]"#);
//!
//! page.set(2);
//! assert_eq!(serde_json::to_string(&args).unwrap(), r#"[2,"users"]"#);
//! ```
//!
//! A cell reachable from its own value is rejected during serialization
//! instead of recursing forever.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer, ser::Error as _};

thread_local! {
    /// Cells currently being serialized on this thread.
    static SERIALIZING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Shared mutable cell whose serialized form is its current value.
pub struct Live<T> {
    cell: Arc<RwLock<T>>,
}

impl<T> Live<T> {
    /// Creates a new cell.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.read().clone()
    }

    /// Replaces the current value.
    pub fn set(&self, value: T) {
        *self.cell.write() = value;
    }

    /// Mutates the current value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.cell.write());
    }

    /// Reads the current value without cloning it.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.cell.read())
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.cell) as *const () as usize
    }
}

impl<T> Clone for Live<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Default> Default for Live<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cell.try_read() {
            Some(value) => f.debug_tuple("Live").field(&*value).finish(),
            None => f.write_str("Live(<locked>)"),
        }
    }
}

impl<T: Serialize> Serialize for Live<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(_guard) = ReentryGuard::enter(self.key()) else {
            return Err(S::Error::custom("cyclic live cell"));
        };
        self.cell.read().serialize(serializer)
    }
}

/// Marks a cell as "being serialized" for the guard's lifetime.
struct ReentryGuard {
    key: usize,
}

impl ReentryGuard {
    fn enter(key: usize) -> Option<Self> {
        SERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return None;
            }
            stack.push(key);
            Some(Self { key })
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        SERIALIZING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|k| *k == self.key) {
                stack.remove(pos);
            }
        });
    }
}
