//! OpenAI compatible chat completions client.
//!
//! Blocking on purpose: every simulation thread waits for its own decision, bounded by the
//! client timeout. There are no retries, a failed call falls back immediately.

use super::{ChatMessage, Conversation, DecisionService, ServiceError};
use crate::config::LlmConfig;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build decision service HTTP client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, conversation: &'a Conversation) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: &conversation.messages,
            max_tokens: conversation.max_tokens,
            temperature: conversation.temperature,
        }
    }
}

impl DecisionService for OpenAiClient {
    fn complete(&self, conversation: &Conversation) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(conversation))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Transport(format!("request timed out: {e}"))
                } else {
                    ServiceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| ServiceError::Malformed("response has no choices".to_string()))?;

        debug!(model = %self.model, reply = %text.trim(), "decision service replied");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:9/v1/".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_client_construction() {
        let client = OpenAiClient::new(&config(), "test-key".into()).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
        assert_eq!(client.name(), LlmConfig::default().model);
    }

    #[test]
    fn test_request_serialization() {
        let client = OpenAiClient::new(&config(), "key".into()).unwrap();
        let conversation = Conversation {
            messages: vec![ChatMessage::user("Hand total: 12")],
            max_tokens: 1,
            temperature: 0.1,
        };
        let json = serde_json::to_value(client.request_body(&conversation)).unwrap();
        assert_eq!(json["model"], LlmConfig::default().model);
        assert_eq!(json["max_tokens"], 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hand total: 12");
    }

    #[test]
    fn test_response_without_choices_parses() {
        let body: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(body.choices.is_empty());
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": "S"}}]}"#)
                .unwrap();
        assert_eq!(body.choices[0].message.as_ref().unwrap().content, "S");
    }
}
