//! HttpAssistantApi - REST implementation of the assistant API collaborator.
//!
//! Talks to the local assistant bridge over JSON:
//! - `POST {base_url}/sessions` with `{ "name": ... }`
//! - `POST {base_url}/query` with `{ "content": ..., "options": { ... } }`

use async_trait::async_trait;
use parley_core::api::{
    AssistantApi, CreateSessionRequest, CreateSessionResponse, QueryOptions, QueryResponse,
};
use parley_core::config::ApiConfig;
use parley_core::error::{ParleyError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Assistant API client backed by `reqwest`.
#[derive(Clone)]
pub struct HttpAssistantApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAssistantApi {
    /// Creates a client for `base_url` with a request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ParleyError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    /// Builds a client from the `[api]` config section.
    ///
    /// When `api_key_env` is set, the variable must exist.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let api = Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;

        match &config.api_key_env {
            Some(var) => {
                let key = env::var(var).map_err(|_| {
                    ParleyError::config(format!("{var} not found in environment variables"))
                })?;
                Ok(api.with_api_key(key))
            }
            None => Ok(api),
        }
    }

    /// Sends the key as a bearer token on every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            ParleyError::api(None, format!("Request to {url} failed: {err}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| ParleyError::api(None, format!("Failed to parse response: {err}")))
    }
}

#[async_trait]
impl AssistantApi for HttpAssistantApi {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse> {
        tracing::debug!("[HttpAssistantApi] create_session name={}", request.name);
        self.post_json("sessions", &request).await
    }

    async fn query(&self, content: &str, options: &QueryOptions) -> Result<QueryResponse> {
        tracing::debug!(
            "[HttpAssistantApi] query model={} max_tokens={}",
            options.model,
            options.max_tokens
        );
        let body = QueryRequest { content, options };
        self.post_json("query", &body).await
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    content: &'a str,
    options: &'a QueryOptions,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn map_http_error(status: StatusCode, body: String) -> ParleyError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    ParleyError::api(Some(status.as_u16()), message)
}
