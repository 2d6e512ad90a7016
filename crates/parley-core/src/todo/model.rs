//! Todo domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Progress of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

/// A todo item tracked alongside the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    /// Present only while `status` is `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status: TodoStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Moves the todo to `status`, keeping `completed_at` consistent with it.
    pub fn transition(&mut self, status: TodoStatus) {
        self.status = status;
        self.completed_at = match status {
            TodoStatus::Completed => Some(Utc::now()),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_sets_timestamp() {
        let mut todo = Todo::new("t1", "write docs");
        todo.transition(TodoStatus::Completed);
        assert!(todo.completed_at.is_some());
    }

    #[test]
    fn test_leaving_completed_clears_timestamp() {
        let mut todo = Todo::new("t1", "write docs");
        todo.transition(TodoStatus::Completed);
        todo.transition(TodoStatus::InProgress);
        assert_eq!(todo.status, TodoStatus::InProgress);
        assert!(todo.completed_at.is_none());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&TodoStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(TodoStatus::InProgress.to_string(), "in_progress");
    }
}
