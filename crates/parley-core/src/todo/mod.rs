//! Todo domain module.

mod model;

pub use model::{Todo, TodoStatus};
