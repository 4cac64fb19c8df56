//! Guardrail core: safety evaluation orchestration for language models
//!
//! Fans a batch of safety test prompts out across configured model
//! endpoints, tracks the batch as a controllable task with pause/resume/stop
//! semantics, and aggregates scored results into a report.
//!
//! # Components
//!
//! - [`engine::FanoutEngine`] — concurrent dispatch of (model, prompt)
//!   pairs, one outcome per unit, per-unit failure isolation
//! - [`task::TaskController`] — task lifecycle: PENDING → RUNNING →
//!   COMPLETED/FAILED with pause/resume/stop control
//! - [`report::ReportAggregator`] — pass/fail counts, per-dimension mean
//!   scores, per-category breakdowns
//! - [`registry`] / [`catalog`] — collaborator interfaces for model
//!   configuration and reusable test prompts
//! - [`llm`] — the opaque remote model call
//!
//! # Example
//!
//! ```rust,ignore
//! use guardrail_core::engine::{EvaluationUnit, FanoutEngine};
//! use guardrail_core::task::TaskController;
//!
//! let controller = TaskController::new(engine);
//! let task_id = controller.create(units).await?;
//! controller.start(&task_id).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod task;
pub mod types;

// Re-exports for convenience
pub use catalog::{CaseFilter, InMemoryCatalog, SamplingOverrides, TestCase, TestCaseCatalog};
pub use config::{EngineConfig, ReportConfig};
pub use engine::{EvaluationResult, EvaluationUnit, FanoutEngine, PromptSource, UnitOutcome};
pub use error::{GuardrailError, GuardrailResult};
pub use llm::{Completion, HttpInvoker, ModelInvoker};
pub use registry::{InMemoryModelRegistry, ModelConfig, ModelRegistry};
pub use report::{Report, ReportAggregator};
pub use scoring::{Dimension, DimensionScores, RefusalScorer, Scorer};
pub use task::{ControlAction, Task, TaskController, TaskStatus};
pub use types::{CaseId, ModelId, Page, TaskId, UnitId};
