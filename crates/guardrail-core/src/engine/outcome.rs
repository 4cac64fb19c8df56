//! Per-unit outcomes: completed results and failure records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{Completion, InvokeError, TokenUsage};
use crate::registry::ModelConfig;
use crate::scoring::DimensionScores;
use crate::types::ModelId;

/// Result of one successfully executed evaluation unit
///
/// Never mutated after creation; owned by the task that scheduled it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Target model id
    pub model_id: ModelId,
    /// Model display name at execution time
    pub model_name: String,
    /// Response text
    pub response: String,
    /// Raw provider payload, kept opaque
    pub raw_response: serde_json::Value,
    /// Wall-clock execution time in seconds
    pub execution_time_secs: f64,
    /// Token counts
    pub usage: TokenUsage,
    /// Per-dimension safety scores, when a scorer produced them
    #[serde(default)]
    pub scores: Option<DimensionScores>,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// Build a result from a completion
    pub fn from_completion(
        model: &ModelConfig,
        completion: Completion,
        scores: Option<DimensionScores>,
    ) -> Self {
        Self {
            model_id: model.id.clone(),
            model_name: model.name.clone(),
            response: completion.text,
            raw_response: completion.raw,
            execution_time_secs: completion.duration_secs,
            usage: completion.usage,
            scores,
            completed_at: Utc::now(),
        }
    }
}

/// Kind of a unit-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    MalformedResponse,
}

impl From<&InvokeError> for FailureKind {
    fn from(error: &InvokeError) -> Self {
        match error {
            InvokeError::Timeout { .. } => Self::Timeout,
            InvokeError::Transport(_) => Self::Transport,
            InvokeError::MalformedResponse(_) => Self::MalformedResponse,
        }
    }
}

/// Explicit failure record for one evaluation unit
///
/// A failed unit is never silently dropped: its failure takes the place of
/// the result in the task's outcome set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitFailure {
    /// Target model id
    pub model_id: ModelId,
    /// Failure kind
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Failure timestamp
    pub failed_at: DateTime<Utc>,
}

impl UnitFailure {
    /// Build a failure record from an invoke error
    pub fn from_error(model_id: ModelId, error: &InvokeError) -> Self {
        Self {
            model_id,
            kind: FailureKind::from(error),
            message: error.to_string(),
            failed_at: Utc::now(),
        }
    }
}

/// Settled outcome of one evaluation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    Completed(EvaluationResult),
    Failed(UnitFailure),
}

impl UnitOutcome {
    /// True for failure outcomes
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The result, if this unit completed
    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    /// Scores attached to a completed outcome
    pub fn scores(&self) -> Option<&DimensionScores> {
        self.result().and_then(|r| r.scores.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_from_error() {
        let err = InvokeError::Timeout { seconds: 10 };
        let failure = UnitFailure::from_error(ModelId::new("m1"), &err);
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.message.contains("10"));
    }

    #[test]
    fn test_outcome_accessors() {
        let failure = UnitOutcome::Failed(UnitFailure::from_error(
            ModelId::new("m1"),
            &InvokeError::Transport("reset".into()),
        ));
        assert!(failure.is_failure());
        assert!(failure.result().is_none());
        assert!(failure.scores().is_none());
    }
}
