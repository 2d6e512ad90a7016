//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `SessionStatus`)
//! - `message`: Message types (`Message`, `MessageRole`, `ToolCall`, `DeliveryStatus`)

mod message;
mod model;

// Re-export public API
pub use message::{DeliveryStatus, Message, MessageRole, ToolCall, ToolCallStatus};
pub use model::{Session, SessionStatus};
