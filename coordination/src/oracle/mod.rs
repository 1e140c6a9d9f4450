//! Decision oracle: the external generative service every participant
//! decision goes through.
//!
//! The core only depends on the [`DecisionOracle`] trait. Transient
//! failures are absorbed by [`RetryingOracle`], which never raises: on
//! exhaustion it hands back a sentinel string that callers recognise with
//! [`is_failure`] and answer with a deterministic fallback.

pub mod http;
pub mod retry;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::OpenAiOracle;
pub use retry::{is_failure, RetryPolicy, RetryingOracle, SharedOracle, FAILURE_SENTINEL};
pub use scripted::ScriptedOracle;

/// Errors from a single oracle attempt.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    ParseError(String),

    #[error("empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling settings for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    /// Gameplay decisions: 0.8 temperature, 1024 tokens.
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 1024,
        }
    }
}

impl SamplingParams {
    /// Lower-randomness settings for memory summaries.
    pub fn summary(max_tokens: u32) -> Self {
        Self {
            temperature: 0.3,
            max_tokens,
        }
    }
}

/// One oracle call: role-scoped instructions, assembled context, the live
/// prompt and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub system: String,
    pub history: Vec<ChatMessage>,
    pub prompt: String,
    pub params: SamplingParams,
}

impl OracleRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            prompt: prompt.into(),
            params: SamplingParams::default(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }
}

/// A generative decision service. Implementations must be safe to retry.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Identifier for logs (usually the model name).
    fn name(&self) -> &str;

    /// Produce free text for the request.
    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError>;
}
