//! Model registry collaborator
//!
//! Stores model endpoint configuration. The core only consumes the narrow
//! [`ModelRegistry`] interface; the in-memory implementation here backs the
//! SDK, the CLI, and tests. Persistent registries live outside this crate.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{GuardrailError, GuardrailResult};
use crate::types::ModelId;

/// Configuration of one evaluatable model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Registry identifier
    pub id: ModelId,
    /// Display name
    pub name: String,
    /// Provider-side model identifier string
    pub model: String,
    /// Endpoint base URL (None = provider default)
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key for the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature, 0.0..=2.0
    pub temperature: f32,
    /// Maximum output tokens, at least 1
    pub max_tokens: u32,
}

impl ModelConfig {
    pub fn new(id: impl Into<ModelId>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            base_url: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    /// Set the endpoint base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Check field constraints
    pub fn validate(&self) -> GuardrailResult<()> {
        if self.model.trim().is_empty() {
            return Err(GuardrailError::validation(format!(
                "model {} has an empty model identifier",
                self.id
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GuardrailError::validation(format!(
                "model {}: temperature {} outside 0.0..=2.0",
                self.id, self.temperature
            )));
        }
        if self.max_tokens < 1 {
            return Err(GuardrailError::validation(format!(
                "model {}: max_tokens must be at least 1",
                self.id
            )));
        }
        Ok(())
    }
}

/// Read access to the model registry
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// All registered models
    async fn list(&self) -> GuardrailResult<Vec<ModelConfig>>;

    /// One model by id
    async fn get(&self, id: &ModelId) -> GuardrailResult<ModelConfig>;

    /// Check that the model's endpoint is reachable
    async fn verify(&self, id: &ModelId) -> GuardrailResult<()>;
}

/// In-memory model registry
#[derive(Debug, Default)]
pub struct InMemoryModelRegistry {
    models: RwLock<HashMap<ModelId, ModelConfig>>,
}

impl InMemoryModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of configs, validating each
    pub fn with_models(models: Vec<ModelConfig>) -> GuardrailResult<Self> {
        let registry = Self::new();
        for model in models {
            registry.insert(model)?;
        }
        Ok(registry)
    }

    /// Add or replace a model config
    pub fn insert(&self, model: ModelConfig) -> GuardrailResult<()> {
        model.validate()?;
        self.models.write().insert(model.id.clone(), model);
        Ok(())
    }

    /// Remove a model config
    pub fn remove(&self, id: &ModelId) -> Option<ModelConfig> {
        self.models.write().remove(id)
    }
}

#[async_trait]
impl ModelRegistry for InMemoryModelRegistry {
    async fn list(&self) -> GuardrailResult<Vec<ModelConfig>> {
        let mut models: Vec<ModelConfig> = self.models.read().values().cloned().collect();
        models.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(models)
    }

    async fn get(&self, id: &ModelId) -> GuardrailResult<ModelConfig> {
        self.models
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| GuardrailError::model_not_found(id.as_str()))
    }

    async fn verify(&self, id: &ModelId) -> GuardrailResult<()> {
        // No endpoint to probe for the in-memory store; existence is the
        // reachability check.
        self.get(id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_temperature_range() {
        let model = ModelConfig::new("m1", "Model One", "gpt-4").with_temperature(2.5);
        assert!(model.validate().is_err());

        let model = ModelConfig::new("m1", "Model One", "gpt-4").with_temperature(2.0);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_max_tokens() {
        let model = ModelConfig::new("m1", "Model One", "gpt-4").with_max_tokens(0);
        assert!(model.validate().is_err());
    }

    #[tokio::test]
    async fn test_in_memory_registry_get() {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "gpt-4"))
            .unwrap();

        let found = registry.get(&ModelId::new("m1")).await.unwrap();
        assert_eq!(found.name, "Model One");

        let missing = registry.get(&ModelId::new("m2")).await;
        assert!(matches!(missing, Err(GuardrailError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_id() {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("b", "B", "model-b"))
            .unwrap();
        registry
            .insert(ModelConfig::new("a", "A", "model-a"))
            .unwrap();

        let models = registry.list().await.unwrap();
        assert_eq!(models[0].id.as_str(), "a");
        assert_eq!(models[1].id.as_str(), "b");
    }
}
