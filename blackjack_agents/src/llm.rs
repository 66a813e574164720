//! Delegation of player and dealer decisions to an external, chat style decision service.
//!
//! A service call can fail in many ways (transport errors, timeouts, bad status codes, replies
//! that do not parse). None of those reach the game: `consult` always produces a decision,
//! either the service's or the caller supplied fallback.

pub mod openai;
pub mod prompt;

use crate::config::LlmConfig;
use crate::game::strategy::Action;
use blackjack_lib::Chips;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use std::sync::Arc;
use tracing::{debug, warn};

pub use openai::OpenAiClient;

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> ChatMessage {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> ChatMessage {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A complete request for the decision service: the messages plus sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Conversation {
    /// The last user message, i.e. the actual question.
    pub fn question(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// Ways a decision service call can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// A blocking decision service. Calls are bounded by the implementation's own timeout.
pub trait DecisionService: Send + Sync {
    /// Sends `conversation` and returns the raw text of the reply.
    fn complete(&self, conversation: &Conversation) -> Result<String, ServiceError>;

    /// Name of the model or service, for logging.
    fn name(&self) -> &str;
}

/// Stand in used when no service is configured. Every call fails, so every decision falls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineService;

impl DecisionService for OfflineService {
    fn complete(&self, _conversation: &Conversation) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable(
            "no decision service configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// The outcome of consulting a decision service. Both variants carry a usable decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<T> {
    Service(T),
    Fallback(T),
}

impl<T> Decision<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decision::Service(t) | Decision::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Decision::Fallback(_))
    }
}

/// Asks `service` and parses the reply with `parse`. A failed call and a reply that `parse`
/// rejects are handled the same way: `fallback` is evaluated and returned.
pub fn consult<T, P, F>(
    service: &dyn DecisionService,
    conversation: &Conversation,
    parse: P,
    fallback: F,
) -> Decision<T>
where
    P: FnOnce(&str) -> Option<T>,
    F: FnOnce() -> T,
{
    let question = conversation.question().unwrap_or_default();
    match service.complete(conversation) {
        Ok(reply) => match parse(&reply) {
            Some(decision) => {
                debug!(service = service.name(), reply = %reply.trim(), "service decision");
                Decision::Service(decision)
            }
            None => {
                warn!(service = service.name(), question, reply = %reply.trim(), "unparseable reply, using fallback");
                Decision::Fallback(fallback())
            }
        },
        // Offline play falls back on every call, only real failures are worth a warning.
        Err(e @ ServiceError::Unavailable(_)) => {
            debug!(service = service.name(), error = %e, "using fallback");
            Decision::Fallback(fallback())
        }
        Err(e) => {
            warn!(service = service.name(), question, error = %e, "decision service failed, using fallback");
            Decision::Fallback(fallback())
        }
    }
}

/// Parses a bet reply. The whole trimmed reply must be an integer, integers outside the chip
/// range saturate and are left to the caller's clamp.
pub fn parse_bet(reply: &str) -> Option<Chips> {
    match reply.trim().parse::<Chips>() {
        Ok(bet) => Some(bet),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(Chips::MAX),
            IntErrorKind::NegOverflow => Some(Chips::MIN),
            _ => None,
        },
    }
}

/// Parses an action reply from its first non whitespace character, case insensitive.
pub fn parse_action(reply: &str) -> Option<Action> {
    reply
        .trim()
        .chars()
        .next()
        .and_then(|c| Action::from_code(c.to_ascii_uppercase()))
}

/// Builds the service described by `config`. Without an API key in the environment the
/// offline stand in is returned and every decision uses its fallback.
pub fn connect(config: &LlmConfig) -> anyhow::Result<Arc<dyn DecisionService>> {
    match config.api_key() {
        Some(api_key) => Ok(Arc::new(OpenAiClient::new(config, api_key)?)),
        None => {
            warn!(
                api_key_env = %config.api_key_env,
                "no API key configured, delegated agents will use their fallback rules"
            );
            Ok(Arc::new(OfflineService))
        }
    }
}
