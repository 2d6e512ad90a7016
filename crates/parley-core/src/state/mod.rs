//! Application state domain module.
//!
//! - `model`: the published snapshot and its persisted subset
//! - `repository`: persistence trait

pub mod model;
pub mod repository;

pub use model::{MAX_RECENT_PROJECTS, PersistedState, StoreSnapshot, StreamingMessage};
pub use repository::StateRepository;
