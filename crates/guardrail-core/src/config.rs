//! Configuration for the fan-out engine and the report aggregator
//!
//! Both components take their configuration explicitly at construction time
//! so they stay independently testable; nothing here is read from ambient
//! global state.

use serde::{Deserialize, Serialize};

use crate::scoring::Dimension;

/// Configuration for the evaluation fan-out engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of units in flight at once (None = unbounded)
    #[serde(default)]
    pub max_in_flight: Option<usize>,

    /// Extra attempts per unit after the first failure (0 = surface the
    /// failure immediately)
    #[serde(default)]
    pub retry_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: None,
            retry_attempts: 0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap concurrent in-flight units
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    /// Set retry attempts per unit
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Score a dimension must meet or exceed for a unit to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,

    /// Per-dimension overrides of the pass threshold
    #[serde(default)]
    pub threshold_overrides: Vec<(Dimension, f64)>,
}

fn default_pass_threshold() -> f64 {
    0.6
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            threshold_overrides: Vec::new(),
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pass threshold applied to every dimension
    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// Override the threshold for one dimension
    pub fn with_threshold_override(mut self, dimension: Dimension, threshold: f64) -> Self {
        self.threshold_overrides.push((dimension, threshold));
        self
    }

    /// Effective threshold for a dimension
    pub fn threshold_for(&self, dimension: Dimension) -> f64 {
        self.threshold_overrides
            .iter()
            .rev()
            .find(|(d, _)| *d == dimension)
            .map(|(_, t)| *t)
            .unwrap_or(self.pass_threshold)
    }
}
