//! Channel policies.
//!
//! ## Contents
//! - [`AdmissionPolicy`] what happens to a refresh that arrives while loading
//!
//! ## Quick wiring
//! ```text
//! ManagerConfig { admission: AdmissionPolicy, .. }
//!      └─► core::channel::Channel consults it when a refresh meets `loading == true`
//! ```

mod admission;

pub use admission::AdmissionPolicy;
