//! Guardrail SDK
//!
//! High-level client for running safety evaluations programmatically: build
//! a batch from selected models and test cases, submit it as a task, steer
//! it, and pull reports.
//!
//! # Example
//!
//! ```rust,ignore
//! use guardrail_sdk::{GuardrailClient, TaskRequest};
//!
//! let client = GuardrailClient::builder()
//!     .with_registry(registry)
//!     .with_catalog(catalog)
//!     .build()?;
//!
//! let units = client.build_units(&request).await?;
//! let task_id = client.submit_task(units).await?;
//! let task = client.wait_until_settled(&task_id, None, None).await?;
//! let report = client.get_report(&task_id)?;
//! ```

mod client;

pub use client::{CustomPrompt, GuardrailClient, GuardrailClientBuilder, TaskRequest};

// Re-export commonly used types from core
pub use guardrail_core::{
    catalog::{CaseFilter, InMemoryCatalog, TestCase, TestCaseCatalog},
    config::{EngineConfig, ReportConfig},
    engine::{EvaluationUnit, UnitOutcome},
    error::{GuardrailError, GuardrailResult},
    registry::{InMemoryModelRegistry, ModelConfig, ModelRegistry},
    report::Report,
    task::{ControlAction, Task, TaskStatus, TaskSummary},
    types::{CaseId, ModelId, Page, TaskId},
};
