//! Chat completion API interaction.
//!
//! This module talks to an OpenAI-compatible `/chat/completions` endpoint.
//!
//! # Architecture
//!
//! - [`AskAsync`]: the seam the summarizer depends on; one system prompt and
//!   one user message in, completion text out
//! - [`OpenAiChat`]: the HTTP implementation
//!
//! Requests are issued once. Rate limits, auth failures and transport errors
//! come back as [`CompletionError`] for the caller to handle.

use crate::error::CompletionError;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for async LLM interaction.
///
/// Implementors send a system instruction and user content to a model and
/// return the model's reply.
pub trait AskAsync {
    async fn ask(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// Client for an OpenAI-compatible chat completions API.
pub struct OpenAiChat {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// Cap on completion length; a newsletter paragraph fits well inside it.
    pub max_tokens: u32,
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiChat {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 400,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Confirm the API key is accepted by listing models.
    ///
    /// Costs no tokens; run once at startup so a bad key is caught before
    /// any article is fetched.
    #[instrument(level = "info", skip_all)]
    pub async fn check_credentials(&self) -> Result<(), CompletionError> {
        let resp = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }
        info!("Completion provider accepted credentials");
        Ok(())
    }
}

impl AskAsync for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = status_error(status.as_u16(), &body);
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %err, "API call failed");
            return Err(err);
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CompletionError::Empty)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = content.chars().count(),
            "Completion received"
        );
        Ok(content)
    }
}

/// Prefer the provider's own error message; fall back to the raw body.
fn status_error(status: u16, body: &str) -> CompletionError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| truncate_for_log(body, 300));
    CompletionError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_status_error_uses_provider_message() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        match status_error(429, body) {
            CompletionError::Status { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        match status_error(500, "upstream exploded") {
            CompletionError::Status { message, .. } => assert_eq!(message, "upstream exploded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ask_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "article text"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "A short synopsis."},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("sk-test", server.uri(), "gpt-test").unwrap();
        let reply = chat.ask("be brief", "article text").await.unwrap();
        assert_eq!(reply, "A short synopsis.");
    }

    #[tokio::test]
    async fn test_ask_reports_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("sk-bad", server.uri(), "gpt-test").unwrap();
        let err = chat.ask("s", "u").await.unwrap_err();
        assert!(matches!(err, CompletionError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_ask_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("sk", server.uri(), "gpt-test").unwrap();
        assert!(matches!(
            chat.ask("s", "u").await,
            Err(CompletionError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_check_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-bad"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&server)
            .await;

        let good = OpenAiChat::new("sk-good", server.uri(), "m").unwrap();
        assert!(good.check_credentials().await.is_ok());

        let bad = OpenAiChat::new("sk-bad", server.uri(), "m").unwrap();
        assert!(matches!(
            bad.check_credentials().await,
            Err(CompletionError::Status { status: 401, .. })
        ));
    }
}
