//! Permission domain models.
//!
//! Tools invoked by the assistant are gated by a per-tool decision. When no
//! decision is recorded (or the decision is `Ask`), the user is prompted via a
//! single outstanding [`PermissionRequest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Persisted per-tool policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
    Ask,
}

/// Tool name to decision mapping.
pub type Permissions = BTreeMap<String, PermissionDecision>;

/// The user's answer to a permission prompt.
///
/// Only `Always` is remembered; `Allow` and `Deny` apply to the single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionResponse {
    Allow,
    Deny,
    Always,
}

/// A pending ask-for-permission prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub id: String,
    pub tool: String,
    pub parameters: Value,
    pub timestamp: DateTime<Utc>,
}

impl PermissionRequest {
    pub fn new(id: impl Into<String>, tool: impl Into<String>, parameters: Value) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            parameters,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of asking the store whether a tool may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionCheck {
    /// A recorded `Allow` decision covers the tool.
    Allowed,
    /// A recorded `Deny` decision covers the tool.
    Denied,
    /// A prompt was raised; the id is the new request's id.
    Pending(String),
    /// Another prompt is still outstanding; nothing was raised.
    Busy,
}
