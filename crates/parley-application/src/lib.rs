//! Application layer for Parley.
//!
//! Hosts the [`AppStore`], the single source of truth the UI reads from, and
//! the composition root that wires it to configuration, storage and the
//! assistant API.

pub mod bootstrap;
pub mod store;
pub mod subscription;

pub use bootstrap::{AppBootstrap, bootstrap};
pub use store::AppStore;
pub use subscription::SliceSubscription;
