//! Runtime core: channels, scheduling and the manager.
//!
//! The public API from this module is [`Manager`], its [`ManagerBuilder`] and
//! [`ManagerConfig`].
//!
//! Internal modules:
//! - [`channel`]: execution state of one signature, subscriber fan-out;
//! - [`scheduler`]: interval coalescing and timer bookkeeping;
//! - [`runner`]: executes one call with panic capture;
//! - [`manager`]: signature registry, channel creation and eviction.

mod builder;
pub(crate) mod channel;
mod config;
mod manager;
mod runner;
mod scheduler;

pub use builder::ManagerBuilder;
pub use config::ManagerConfig;
pub use manager::Manager;
