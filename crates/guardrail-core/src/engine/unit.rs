//! Evaluation units and prompt sources

use serde::{Deserialize, Serialize};

use crate::catalog::{SamplingOverrides, TestCase};
use crate::error::{GuardrailError, GuardrailResult};
use crate::types::{ModelId, UnitId};

/// Where a unit's prompt comes from
///
/// Either a catalog case or ad-hoc custom text; every unit resolves to
/// exactly one concrete prompt string before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptSource {
    /// A catalog test case, copied into the unit at construction time
    Catalog { case: TestCase },
    /// Ad-hoc prompt text
    Custom {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system_prompt: Option<String>,
    },
}

/// One scheduled (model, prompt) execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationUnit {
    /// Unit identifier, unique within a task
    pub id: UnitId,
    /// Target model
    pub model_id: ModelId,
    /// Prompt source
    pub source: PromptSource,
}

impl EvaluationUnit {
    /// Build a unit from a catalog case
    pub fn from_case(model_id: ModelId, case: TestCase) -> Self {
        Self {
            id: UnitId::generate(),
            model_id,
            source: PromptSource::Catalog { case },
        }
    }

    /// Build a unit from custom prompt text
    pub fn custom(model_id: ModelId, prompt: impl Into<String>) -> Self {
        Self {
            id: UnitId::generate(),
            model_id,
            source: PromptSource::Custom {
                prompt: prompt.into(),
                system_prompt: None,
            },
        }
    }

    /// Attach a system prompt to a custom unit; no-op for catalog units
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        if let PromptSource::Custom { system_prompt, .. } = &mut self.source {
            *system_prompt = Some(system.into());
        }
        self
    }

    /// The concrete prompt string this unit executes
    pub fn prompt(&self) -> &str {
        match &self.source {
            PromptSource::Catalog { case } => &case.prompt,
            PromptSource::Custom { prompt, .. } => prompt,
        }
    }

    /// System prompt, if any
    pub fn system_prompt(&self) -> Option<&str> {
        match &self.source {
            PromptSource::Catalog { .. } => None,
            PromptSource::Custom { system_prompt, .. } => system_prompt.as_deref(),
        }
    }

    /// Safety category of the originating case, if any
    pub fn category(&self) -> Option<&str> {
        match &self.source {
            PromptSource::Catalog { case } => Some(&case.category),
            PromptSource::Custom { .. } => None,
        }
    }

    /// Probing method of the originating case, if any
    pub fn method(&self) -> Option<&str> {
        match &self.source {
            PromptSource::Catalog { case } => Some(&case.method),
            PromptSource::Custom { .. } => None,
        }
    }

    /// Expected-behavior text of the originating case, if any
    pub fn expected_behavior(&self) -> Option<&str> {
        match &self.source {
            PromptSource::Catalog { case } => case.expected_behavior.as_deref(),
            PromptSource::Custom { .. } => None,
        }
    }

    /// Sampling overrides carried by the originating case
    pub fn sampling(&self) -> SamplingOverrides {
        match &self.source {
            PromptSource::Catalog { case } => case.sampling,
            PromptSource::Custom { .. } => SamplingOverrides::default(),
        }
    }

    /// Reject units that cannot resolve to a concrete prompt
    pub fn validate(&self) -> GuardrailResult<()> {
        if self.model_id.as_str().trim().is_empty() {
            return Err(GuardrailError::validation(format!(
                "unit {} has an empty model id",
                self.id
            )));
        }
        if self.prompt().trim().is_empty() {
            return Err(GuardrailError::validation(format!(
                "unit {} resolves to an empty prompt",
                self.id
            )));
        }
        Ok(())
    }
}
