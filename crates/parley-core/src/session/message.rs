//! Conversation message types.
//!
//! This module contains types for representing messages in a session,
//! including roles, tool invocations and delivery tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// Lifecycle of a single tool invocation attached to an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A tool invocation requested by the assistant.
///
/// `parameters` and `result` are opaque to the store and kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool: String,
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub status: ToolCallStatus,
}

/// Delivery state of a user message handed to the assistant API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    /// Request is in flight.
    Pending,
    /// The assistant replied.
    Delivered,
    /// The request errored; no reply was recorded.
    Failed,
    /// The request was cancelled or superseded by a newer one.
    Cancelled,
}

/// A single message in a session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// True only while the content is still being filled in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryStatus>,
}

impl Message {
    /// Creates a user message awaiting delivery.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            tool_calls: None,
            streaming: None,
            delivery: Some(DeliveryStatus::Pending),
        }
    }

    /// Creates the empty assistant placeholder shown while a reply is generated.
    pub fn assistant_placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            tool_calls: None,
            streaming: Some(true),
            delivery: None,
        }
    }

    /// Turns a placeholder into the finished assistant reply.
    pub fn finalize(mut self, content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        self.content = content.into();
        self.streaming = Some(false);
        self.timestamp = Utc::now();
        self.tool_calls = (!tool_calls.is_empty()).then_some(tool_calls);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_starts_pending() {
        let msg = Message::user("m1", "hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.delivery, Some(DeliveryStatus::Pending));
        assert!(!msg.is_streaming());
    }

    #[test]
    fn test_finalize_placeholder() {
        let placeholder = Message::assistant_placeholder("m2");
        assert!(placeholder.is_streaming());

        let done = placeholder.finalize("hi there", Vec::new());
        assert_eq!(done.content, "hi there");
        assert_eq!(done.streaming, Some(false));
        assert!(done.tool_calls.is_none());
    }

    #[test]
    fn test_finalize_keeps_tool_calls() {
        let call = ToolCall {
            tool: "bash".to_string(),
            parameters: serde_json::json!({"command": "ls"}),
            result: None,
            status: ToolCallStatus::Pending,
        };
        let done = Message::assistant_placeholder("m3").finalize("", vec![call.clone()]);
        assert_eq!(done.tool_calls, Some(vec![call]));
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::assistant_placeholder("m4").finalize("ok", Vec::new());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["streaming"], false);
        assert!(json.get("toolCalls").is_none());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(MessageRole::System.to_string(), "system");
        assert_eq!(DeliveryStatus::Cancelled.to_string(), "cancelled");
    }
}
