/// HTTP client for the Anthropic messages endpoint.
///
/// `ureq` is blocking, so each request runs on tokio's blocking pool. The
/// agent carries the same timeout as the caller's `tokio::time::timeout`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

use super::{Completion, CompletionRequest, GeneratorSettings, Segment, TextGenerator};

#[derive(Clone)]
pub struct AnthropicClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, api_version: impl Into<String>, timeout: Duration) -> Self {
        AnthropicClient {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: api_version.into(),
        }
    }

    /// Build from settings, reading the key from `settings.api_key_env`.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, LevelError> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            LevelError::Generation(format!("environment variable {} is not set", settings.api_key_env))
        })?;
        Ok(Self::new(&settings.endpoint, api_key, &settings.api_version, settings.timeout))
    }

    fn post(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse, LevelError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", &self.api_version)
            .set("content-type", "application/json")
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let detail = resp.into_string().unwrap_or_default();
                    LevelError::Generation(format!("endpoint returned {code}: {detail}"))
                }
                other => LevelError::Generation(other.to_string()),
            })?;
        response
            .into_json::<MessagesResponse>()
            .map_err(|e| LevelError::Generation(format!("unreadable response: {e}")))
    }
}

// ── Wire format ──

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl From<MessagesResponse> for Completion {
    fn from(r: MessagesResponse) -> Self {
        Completion {
            segments: r
                .content
                .into_iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => Segment::Text(text),
                    ContentBlock::Other => Segment::Other,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LevelError> {
        let client = self.clone();
        let request = request.clone();
        let response = tokio::task::spawn_blocking(move || {
            let body = MessagesRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                system: &request.system,
                messages: [Message { role: "user", content: &request.prompt }],
            };
            client.post(&body)
        })
        .await
        .map_err(|e| LevelError::Generation(format!("request task failed: {e}")))??;
        Ok(response.into())
    }
}
