//! Assistant API collaborator contract.
//!
//! The store only depends on this trait; `parley-interaction` ships the HTTP
//! implementation and tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::ToolCall;

/// Body of a remote session allocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
}

/// Remote session allocation result.
///
/// Anything other than `success == true` with a session id is a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl CreateSessionResponse {
    pub fn ok(session_id: impl Into<String>) -> Self {
        Self {
            success: true,
            session_id: Some(session_id.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            session_id: None,
        }
    }

    /// The allocated id, if the call succeeded.
    pub fn into_session_id(self) -> Option<String> {
        if self.success {
            self.session_id.filter(|id| !id.is_empty())
        } else {
            None
        }
    }
}

/// Generation parameters sent with every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token usage reported alongside a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Usage {
    pub total_tokens: u64,
    pub cost: f64,
}

/// Reply to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub data: String,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl QueryResponse {
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            usage: None,
            tool_calls: Vec::new(),
        }
    }
}

/// Remote assistant API consumed by the store.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Allocates a remote session.
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse>;

    /// Sends `content` and waits for the full reply.
    async fn query(&self, content: &str, options: &QueryOptions) -> Result<QueryResponse>;
}
