//! Error types for Guardrail

use thiserror::Error;

use crate::task::{ControlAction, TaskStatus};

/// Result type alias for Guardrail operations
pub type GuardrailResult<T> = Result<T, GuardrailError>;

/// Main error type for Guardrail
#[derive(Error, Debug, Clone)]
pub enum GuardrailError {
    /// Malformed or empty input rejected before any work was scheduled
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A control command was not legal for the task's current state
    #[error("Invalid transition: cannot {action} a {from} task")]
    InvalidTransition {
        from: TaskStatus,
        action: ControlAction,
    },

    /// A remote model call failed; scoped to a single evaluation unit
    #[error("Remote call failed for model {model}: {message}")]
    RemoteCall { model: String, message: String },

    /// The fan-out engine could not be started at all
    #[error("Task start failed: {0}")]
    TaskStart(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(String),
}

impl GuardrailError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error for a model id
    pub fn model_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Model",
            id: id.into(),
        }
    }

    /// Create a not-found error for a task id
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Task",
            id: id.into(),
        }
    }

    /// Create a not-found error for a test case id
    pub fn case_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "Test case",
            id: id.into(),
        }
    }

    /// Create a new remote call error
    pub fn remote_call(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a new task start error
    pub fn task_start(message: impl Into<String>) -> Self {
        Self::TaskStart(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable kind tag for callers that dispatch on error class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::NotFound { .. } | Self::InvalidTransition { .. } => {
                "validation"
            }
            Self::RemoteCall { .. } => "remote_call",
            Self::TaskStart(_) => "task_start",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Http(_) => "http",
        }
    }
}

impl From<std::io::Error> for GuardrailError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for GuardrailError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<reqwest::Error> for GuardrailError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(GuardrailError::validation("empty").kind(), "validation");
        assert_eq!(GuardrailError::model_not_found("m1").kind(), "validation");
        assert_eq!(GuardrailError::remote_call("m1", "timeout").kind(), "remote_call");
        assert_eq!(GuardrailError::task_start("registry down").kind(), "task_start");
    }

    #[test]
    fn test_display_includes_context() {
        let err = GuardrailError::remote_call("gpt-4", "connection reset");
        assert!(err.to_string().contains("gpt-4"));
        assert!(err.to_string().contains("connection reset"));
    }
}
