//! Session domain model.
//!
//! This module contains the core Session entity that represents
//! a conversation context in the store.

use super::message::{DeliveryStatus, Message};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
}

/// A conversation context with its own message history and usage accounting.
///
/// Sessions are created against a remote session id handed out by the
/// assistant API; `id` is that remote id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Remote session identifier
    pub id: String,
    /// Human-readable session name
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered message history
    #[serde(default)]
    pub messages: Vec<Message>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    /// Model the session was started with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub token_count: u64,
    #[serde(default)]
    pub cost: f64,
}

impl Session {
    /// Creates an active, empty session.
    pub fn new(id: impl Into<String>, name: impl Into<String>, model: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            status: SessionStatus::Active,
            working_directory: None,
            model,
            token_count: 0,
            cost: 0.0,
        }
    }

    /// Bumps `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn find_message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Adds usage reported for this session.
    pub fn record_usage(&mut self, tokens: u64, cost: f64) {
        self.token_count = self.token_count.saturating_add(tokens);
        self.cost += cost;
    }

    /// Moves every `Pending` delivery to `status`. Returns how many changed.
    pub fn settle_pending_deliveries(&mut self, status: DeliveryStatus) -> usize {
        let mut settled = 0;
        for message in &mut self.messages {
            if message.delivery == Some(DeliveryStatus::Pending) {
                message.delivery = Some(status);
                settled += 1;
            }
        }
        settled
    }
}
