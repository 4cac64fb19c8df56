//! Report aggregation
//!
//! Computes summary statistics from a task's current result set. Reports
//! are derived views: recomputed on demand, never persisted, valid at any
//! task state (a RUNNING task yields a partial report).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::engine::{EvaluationUnit, UnitOutcome};
use crate::scoring::{Dimension, DimensionScores};
use crate::task::Task;
use crate::types::TaskId;

/// Bucket name for custom prompts that carry no catalog category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Mean score per safety dimension
///
/// `None` means no unit had that dimension scored; an empty mean is
/// undefined, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionMeans {
    pub safety: Option<f64>,
    pub robustness: Option<f64>,
    pub value_alignment: Option<f64>,
    pub privacy_protection: Option<f64>,
}

impl DimensionMeans {
    /// Mean for one dimension
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Safety => self.safety,
            Dimension::Robustness => self.robustness,
            Dimension::ValueAlignment => self.value_alignment,
            Dimension::Privacy => self.privacy_protection,
        }
    }

    fn set(&mut self, dimension: Dimension, mean: Option<f64>) {
        let slot = match dimension {
            Dimension::Safety => &mut self.safety,
            Dimension::Robustness => &mut self.robustness,
            Dimension::ValueAlignment => &mut self.value_alignment,
            Dimension::Privacy => &mut self.privacy_protection,
        };
        *slot = mean;
    }
}

/// Per-unit detail row in a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDetail {
    /// Category of the originating case, or [`UNCATEGORIZED`]
    pub category: String,
    /// Probing method, if the unit came from the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Model display name, when the unit completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Response text, when the unit completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Failure message, when the unit failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Scores, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<DimensionScores>,
    /// Whether the unit passed the configured thresholds
    pub passed: bool,
}

/// Aggregated view of a task's results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub task_id: TaskId,
    /// Total submitted units
    pub total_cases: usize,
    /// Settled units that passed every threshold
    pub passed_cases: usize,
    /// Settled units that failed (threshold miss or failure outcome)
    pub failed_cases: usize,
    /// Mean score per dimension over the units scored for it
    pub average_scores: DimensionMeans,
    /// Raw per-unit scores grouped by category
    pub category_scores: HashMap<String, Vec<DimensionScores>>,
    /// Per-unit detail rows in submission order (settled units only)
    pub test_details: Vec<UnitDetail>,
    pub generated_at: DateTime<Utc>,
}

/// Computes reports from tasks
///
/// Pure: no side effects, no state beyond configuration.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    config: ReportConfig,
}

impl ReportAggregator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// A settled unit passes when every scored dimension meets its
    /// threshold; a failure outcome always fails
    pub fn unit_passed(&self, outcome: &UnitOutcome) -> bool {
        match outcome.scores() {
            Some(scores) => Dimension::all().iter().all(|d| {
                scores
                    .get(*d)
                    .is_none_or(|score| score >= self.config.threshold_for(*d))
            }),
            None => !outcome.is_failure(),
        }
    }

    /// Build a report from the task's current result set
    pub fn generate(&self, task: &Task) -> Report {
        let mut passed_cases = 0;
        let mut failed_cases = 0;
        let mut per_dimension: HashMap<Dimension, Vec<f64>> = HashMap::new();
        let mut category_scores: HashMap<String, Vec<DimensionScores>> = HashMap::new();
        let mut test_details = Vec::new();

        for (unit, outcome) in task.unit_outcomes() {
            let Some(outcome) = outcome else {
                continue; // not yet settled
            };

            let passed = self.unit_passed(outcome);
            if passed {
                passed_cases += 1;
            } else {
                failed_cases += 1;
            }

            if let Some(scores) = outcome.scores() {
                for dimension in Dimension::all() {
                    if let Some(score) = scores.get(*dimension) {
                        per_dimension.entry(*dimension).or_default().push(score);
                    }
                }
                category_scores
                    .entry(category_of(unit).to_string())
                    .or_default()
                    .push(scores.clone());
            }

            test_details.push(detail_row(unit, outcome, passed));
        }

        let mut average_scores = DimensionMeans::default();
        for dimension in Dimension::all() {
            average_scores.set(*dimension, mean(per_dimension.get(dimension)));
        }

        Report {
            task_id: task.id.clone(),
            total_cases: task.units.len(),
            passed_cases,
            failed_cases,
            average_scores,
            category_scores,
            test_details,
            generated_at: Utc::now(),
        }
    }
}

fn category_of(unit: &EvaluationUnit) -> &str {
    unit.category().unwrap_or(UNCATEGORIZED)
}

fn mean(values: Option<&Vec<f64>>) -> Option<f64> {
    let values = values?;
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn detail_row(unit: &EvaluationUnit, outcome: &UnitOutcome, passed: bool) -> UnitDetail {
    let (model_name, response, error) = match outcome {
        UnitOutcome::Completed(result) => {
            (Some(result.model_name.clone()), Some(result.response.clone()), None)
        }
        UnitOutcome::Failed(failure) => (None, None, Some(failure.message.clone())),
    };
    UnitDetail {
        category: category_of(unit).to_string(),
        method: unit.method().map(str::to_string),
        model_name,
        prompt: unit.prompt().to_string(),
        response,
        error,
        scores: outcome.scores().cloned(),
        passed,
    }
}
