//! Evaluation fan-out engine
//!
//! Turns a set of (model, prompt) pairs into concurrently executed remote
//! calls, collecting exactly one outcome per unit. The engine is stateless
//! across invocations; all batch state lives with the task that owns it.

mod fanout;
mod outcome;
mod unit;

pub use fanout::FanoutEngine;
pub use outcome::{EvaluationResult, FailureKind, UnitFailure, UnitOutcome};
pub use unit::{EvaluationUnit, PromptSource};
