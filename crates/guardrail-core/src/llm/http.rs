//! HTTP invoker for OpenAI-compatible chat-completions endpoints

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::invoker::{Completion, InvokeError, ModelInvoker, TokenUsage};
use crate::catalog::SamplingOverrides;
use crate::error::{GuardrailError, GuardrailResult};
use crate::registry::ModelConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Timeout configuration for remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Time allowed to establish a connection
    pub connection_timeout_secs: u64,
    /// Time allowed for the complete request/response cycle
    pub request_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

/// Invoker that speaks the OpenAI chat-completions wire format
///
/// Works against any endpoint exposing `POST {base_url}/chat/completions`,
/// which covers most hosted and local model servers.
pub struct HttpInvoker {
    client: Client,
    timeouts: TimeoutConfig,
}

impl HttpInvoker {
    /// Create an invoker with default timeouts
    pub fn new() -> GuardrailResult<Self> {
        Self::with_timeouts(TimeoutConfig::default())
    }

    /// Create an invoker with explicit timeouts
    pub fn with_timeouts(timeouts: TimeoutConfig) -> GuardrailResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connection_timeout_secs))
            .timeout(Duration::from_secs(timeouts.request_timeout_secs))
            .build()
            .map_err(|e| GuardrailError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeouts })
    }

    fn endpoint(model: &ModelConfig) -> String {
        let base = model
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn build_body(
        model: &ModelConfig,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: SamplingOverrides,
    ) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        json!({
            "model": model.model,
            "messages": messages,
            "temperature": sampling.temperature.unwrap_or(model.temperature),
            "max_tokens": sampling.max_tokens.unwrap_or(model.max_tokens),
        })
    }

    fn parse_completion(raw: serde_json::Value, duration_secs: f64) -> Result<Completion, InvokeError> {
        let text = raw
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                InvokeError::MalformedResponse("response carries no message content".to_string())
            })?
            .to_string();

        let prompt_tokens = raw
            .pointer("/usage/prompt_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let completion_tokens = raw
            .pointer("/usage/completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(Completion {
            text,
            usage: TokenUsage::new(prompt_tokens, completion_tokens),
            duration_secs,
            raw,
        })
    }
}

#[async_trait]
impl ModelInvoker for HttpInvoker {
    async fn invoke(
        &self,
        model: &ModelConfig,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: SamplingOverrides,
    ) -> Result<Completion, InvokeError> {
        let url = Self::endpoint(model);
        let body = Self::build_body(model, prompt, system_prompt, sampling);

        debug!(model = %model.model, url = %url, "dispatching chat completion");

        let started = Instant::now();
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &model.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InvokeError::Timeout {
                    seconds: self.timeouts.request_timeout_secs,
                }
            } else {
                InvokeError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvokeError::Transport(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InvokeError::MalformedResponse(e.to_string()))?;

        Self::parse_completion(raw, started.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelId;

    fn model() -> ModelConfig {
        ModelConfig::new(ModelId::new("m1"), "Model One", "gpt-4o-mini")
            .with_temperature(0.2)
            .with_max_tokens(512)
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let m = model().with_base_url("http://localhost:8000/v1/");
        assert_eq!(
            HttpInvoker::endpoint(&m),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            HttpInvoker::endpoint(&model()),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_body_applies_overrides() {
        let sampling = SamplingOverrides {
            temperature: Some(0.9),
            max_tokens: None,
        };
        let body = HttpInvoker::build_body(&model(), "hello", Some("be safe"), sampling);
        assert_eq!(body["temperature"], 0.9);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_parse_completion() {
        let raw = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hi there" } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
        });
        let completion = HttpInvoker::parse_completion(raw, 0.5).unwrap();
        assert_eq!(completion.text, "hi there");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_completion_missing_content() {
        let raw = serde_json::json!({ "choices": [] });
        assert!(matches!(
            HttpInvoker::parse_completion(raw, 0.1),
            Err(InvokeError::MalformedResponse(_))
        ));
    }
}
