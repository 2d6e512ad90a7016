pub mod api;
pub mod config;
pub mod error;
pub mod permission;
pub mod session;
pub mod settings;
pub mod state;
pub mod todo;
pub mod ui;

// Re-export common error type
pub use error::ParleyError;
