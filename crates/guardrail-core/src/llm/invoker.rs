//! Invoker trait and completion types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SamplingOverrides;
use crate::registry::ModelConfig;

/// Token counts for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// One completed remote model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Response text
    pub text: String,
    /// Token counts reported by the provider
    pub usage: TokenUsage,
    /// Wall-clock duration of the call in seconds
    pub duration_secs: f64,
    /// Raw provider payload, kept opaque
    pub raw: serde_json::Value,
}

/// Failure of a single remote model call
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl InvokeError {
    /// Stable kind tag for failure records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport(_) => "transport",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Opaque remote evaluation call
///
/// No retry lives at this layer; the fan-out engine owns retry policy.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send one prompt to one model and wait for the completion
    async fn invoke(
        &self,
        model: &ModelConfig,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: SamplingOverrides,
    ) -> Result<Completion, InvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(120, 48);
        assert_eq!(usage.total_tokens, 168);
    }

    #[test]
    fn test_invoke_error_kinds() {
        assert_eq!(InvokeError::Timeout { seconds: 30 }.kind(), "timeout");
        assert_eq!(InvokeError::Transport("reset".into()).kind(), "transport");
        assert_eq!(
            InvokeError::MalformedResponse("no choices".into()).kind(),
            "malformed_response"
        );
    }
}
