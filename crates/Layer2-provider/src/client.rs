//! Completion client
//!
//! OpenAI-compatible chat-completions wire contract, non-streaming. The
//! `CompletionClient` trait is the seam the session layer talks through;
//! tests substitute a scripted implementation.

use crate::error::ClientError;
use crate::message::Message;
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const ENV_API_KEY: &str = "RAILBIRD_API_KEY";
const ENV_BASE_URL: &str = "RAILBIRD_BASE_URL";
const ENV_MODEL: &str = "RAILBIRD_MODEL";

// ============================================================================
// Configuration
// ============================================================================

/// Completion client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Chat-completions endpoint URL
    pub base_url: String,

    /// Bearer token; usually supplied via `RAILBIRD_API_KEY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model ID sent with every request
    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Transport-level retry policy
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            config.api_key = Some(key);
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            config.model = model;
        }
        config
    }
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

// ============================================================================
// Completion result
// ============================================================================

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Completed naturally
    Stop,

    /// Hit the max-token limit; the reply is cut off
    Length,

    /// Content filtered
    ContentFilter,

    /// Unknown/other
    Other,
}

impl FinishReason {
    fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

/// A raw completion as returned by the service
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub finish_reason: FinishReason,
    pub model: String,
}

impl Completion {
    /// Accept or reject the reply.
    ///
    /// A `length` finish is a truncation failure and empty content is a
    /// failure regardless of finish reason; neither may be appended to a
    /// session history.
    pub fn into_text(self) -> Result<String, ClientError> {
        if self.finish_reason == FinishReason::Length {
            return Err(ClientError::Truncated(format!(
                "reply cut off after {} chars",
                self.content.len()
            )));
        }
        if self.content.trim().is_empty() {
            return Err(ClientError::Empty("no content in reply".to_string()));
        }
        Ok(self.content)
    }
}

// ============================================================================
// Client trait
// ============================================================================

/// The seam between the session layer and the remote completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the messages and return the raw completion.
    async fn complete(&self, messages: &[Message]) -> Result<Completion, ClientError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Reqwest-backed client for OpenAI-compatible endpoints.
pub struct HttpCompletionClient {
    client: Client,
    config: ClientConfig,
}

impl HttpCompletionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::NotConfigured(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }

    /// Parse an error body, preferring the structured API error when present.
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
            let message = parsed.error.message;
            return match parsed.error.code.as_deref() {
                Some("rate_limit_exceeded") => ClientError::RateLimited {
                    retry_after_ms: None,
                },
                Some("context_length_exceeded") => ClientError::ContextLengthExceeded(message),
                Some("invalid_api_key") => ClientError::Authentication(message),
                _ => ClientError::from_http_status(status.as_u16(), &message),
            };
        }

        ClientError::from_http_status(status.as_u16(), body)
    }

    async fn send(&self, request: &ChatRequest) -> Result<Completion, ClientError> {
        let mut builder = self.client.post(self.config.base_url.as_str()).json(request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                ClientError::Transport(e.to_string())
            } else {
                ClientError::Transport(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse("no choices in reply".to_string()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, messages: &[Message]) -> Result<Completion, ClientError> {
        let request = self.build_request(messages);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending completion request"
        );
        with_retry(&self.config.retry, "completion", || async {
            self.send(&request).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_wire(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire(Some("length")), FinishReason::Length);
        assert_eq!(
            FinishReason::from_wire(Some("content_filter")),
            FinishReason::ContentFilter
        );
        assert_eq!(FinishReason::from_wire(None), FinishReason::Other);
        assert_eq!(FinishReason::from_wire(Some("weird")), FinishReason::Other);
    }

    #[test]
    fn test_into_text_accepts_stop() {
        let completion = Completion {
            content: "call".to_string(),
            finish_reason: FinishReason::Stop,
            model: "m".to_string(),
        };
        assert_eq!(completion.into_text().unwrap(), "call");
    }

    #[test]
    fn test_into_text_rejects_truncation_even_with_content() {
        let completion = Completion {
            content: "{\"action\": \"rai".to_string(),
            finish_reason: FinishReason::Length,
            model: "m".to_string(),
        };
        assert!(matches!(
            completion.into_text(),
            Err(ClientError::Truncated(_))
        ));
    }

    #[test]
    fn test_into_text_rejects_empty_regardless_of_reason() {
        let completion = Completion {
            content: "   ".to_string(),
            finish_reason: FinishReason::Stop,
            model: "m".to_string(),
        };
        assert!(matches!(completion.into_text(), Err(ClientError::Empty(_))));
    }

    #[test]
    fn test_request_wire_shape() {
        let config = ClientConfig::default();
        let client = HttpCompletionClient::new(config).unwrap();
        let messages = vec![Message::system("primer"), Message::user("state")];
        let request = client.build_request(&messages);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::json!(false));
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "state");
        assert!(json["max_tokens"].is_u64());
    }

    #[test]
    fn test_response_wire_parse() {
        let body = r#"{
            "choices": [
                {"message": {"content": "{\"action\":\"fold\"}"}, "finish_reason": "stop"}
            ],
            "model": "gpt-4o-mini"
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_error_body_parse() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        let body = r#"{"error": {"message": "bad key", "code": "invalid_api_key"}}"#;
        assert!(matches!(
            HttpCompletionClient::parse_error_response(status, body),
            ClientError::Authentication(_)
        ));
    }
}
