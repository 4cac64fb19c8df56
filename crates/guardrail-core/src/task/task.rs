//! Task record: ordered units plus their settled outcomes

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::TaskStatus;
use crate::engine::{EvaluationUnit, UnitOutcome};
use crate::types::{TaskId, UnitId};

/// A named, stateful batch of evaluation units
///
/// `units` preserves submission order for display; `outcomes` fills in
/// completion order, at most one entry per unit. All mutation goes through
/// the [`TaskController`](super::TaskController).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque stable identifier
    pub id: TaskId,
    /// Units in submission order
    pub units: Vec<EvaluationUnit>,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Settled outcomes keyed by unit id
    pub outcomes: HashMap<UnitId, UnitOutcome>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new(units: Vec<EvaluationUnit>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            units,
            status: TaskStatus::Pending,
            outcomes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of units that have settled
    pub fn settled_count(&self) -> usize {
        self.outcomes.len()
    }

    /// True once every unit has an outcome
    pub fn is_fully_settled(&self) -> bool {
        self.outcomes.len() == self.units.len()
    }

    /// Outcome for one unit, if settled
    pub fn outcome_for(&self, unit_id: &UnitId) -> Option<&UnitOutcome> {
        self.outcomes.get(unit_id)
    }

    /// Units in submission order paired with their outcome, if any
    pub fn unit_outcomes(&self) -> impl Iterator<Item = (&EvaluationUnit, Option<&UnitOutcome>)> {
        self.units.iter().map(|u| (u, self.outcomes.get(&u.id)))
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record a settled outcome
    ///
    /// Returns false when the outcome is dropped: late arrival on a terminal
    /// task, a duplicate, or an id that was never submitted.
    pub(crate) fn record_outcome(&mut self, unit_id: UnitId, outcome: UnitOutcome) -> bool {
        if self.status.is_terminal() {
            debug!(task_id = %self.id, unit_id = %unit_id, "dropping late outcome");
            return false;
        }
        if self.outcomes.contains_key(&unit_id) {
            debug!(task_id = %self.id, unit_id = %unit_id, "dropping duplicate outcome");
            return false;
        }
        if !self.units.iter().any(|u| u.id == unit_id) {
            debug!(task_id = %self.id, unit_id = %unit_id, "dropping outcome for unknown unit");
            return false;
        }
        self.outcomes.insert(unit_id, outcome);
        self.updated_at = Utc::now();
        true
    }

    /// Transition RUNNING to COMPLETED once every unit has settled
    pub(crate) fn maybe_finalize(&mut self) {
        if self.status == TaskStatus::Running && self.is_fully_settled() {
            self.set_status(TaskStatus::Completed);
        }
    }

    /// Condensed view for listings
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            status: self.status,
            unit_count: self.units.len(),
            settled_count: self.settled_count(),
            failed_count: self.outcomes.values().filter(|o| o.is_failure()).count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Condensed task view returned by listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub status: TaskStatus,
    pub unit_count: usize,
    pub settled_count: usize,
    pub failed_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
