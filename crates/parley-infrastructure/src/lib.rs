pub mod config_service;
pub mod logging;
pub mod paths;
pub mod state_repository;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::ParleyPaths;
pub use crate::state_repository::{FileStateRepository, InMemoryStateRepository};
