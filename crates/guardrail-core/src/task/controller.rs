//! Task lifecycle controller
//!
//! Single owner of all task state. Every mutation of a task — outcome
//! recording, status transitions — goes through that task's record lock, so
//! concurrent completion callbacks and racing control commands linearize.
//!
//! Pause is a scheduling gate: it stops dispatch of not-yet-started units
//! while in-flight calls finish and still record. Stop finalizes the task
//! with the results collected so far; in-flight calls are not aborted, but
//! anything settling after finalization is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{ControlAction, TaskStatus};
use super::task::{Task, TaskSummary};
use crate::engine::{EvaluationUnit, FanoutEngine};
use crate::error::{GuardrailError, GuardrailResult};
use crate::registry::ModelConfig;
use crate::types::{Page, TaskId, UnitId};

struct TaskEntry {
    record: Mutex<Task>,
    pause: watch::Sender<bool>,
    stop: CancellationToken,
}

/// Controller for creating, starting, and steering evaluation tasks
pub struct TaskController {
    engine: Arc<FanoutEngine>,
    tasks: DashMap<TaskId, Arc<TaskEntry>>,
}

impl TaskController {
    pub fn new(engine: Arc<FanoutEngine>) -> Self {
        Self {
            engine,
            tasks: DashMap::new(),
        }
    }

    fn entry(&self, task_id: &TaskId) -> GuardrailResult<Arc<TaskEntry>> {
        self.tasks
            .get(task_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| GuardrailError::task_not_found(task_id.as_str()))
    }

    /// Validate a batch and store it as a PENDING task
    pub async fn create(&self, units: Vec<EvaluationUnit>) -> GuardrailResult<TaskId> {
        self.engine.validate(&units).await?;

        let task = Task::new(units);
        let task_id = task.id.clone();
        let (pause, _) = watch::channel(false);

        self.tasks.insert(
            task_id.clone(),
            Arc::new(TaskEntry {
                record: Mutex::new(task),
                pause,
                stop: CancellationToken::new(),
            }),
        );

        info!(task_id = %task_id, "task created");
        Ok(task_id)
    }

    /// Transition PENDING to RUNNING and begin fan-out
    ///
    /// Returns as soon as dispatch is underway; outcomes stream into the
    /// task record as units settle. If the engine cannot be started at all
    /// the task goes to FAILED and the error is returned.
    pub async fn start(&self, task_id: &TaskId) -> GuardrailResult<()> {
        let entry = self.entry(task_id)?;

        let units = {
            let record = entry.record.lock();
            if record.status != TaskStatus::Pending {
                return Err(GuardrailError::validation(format!(
                    "task {} cannot start from {}",
                    task_id, record.status
                )));
            }
            record.units.clone()
        };

        // Resolve models up front; a registry failure here means the fan-out
        // never started, which is a task-level failure.
        let models = match self.engine.validate(&units).await {
            Ok(models) => models,
            Err(error) => {
                entry.record.lock().set_status(TaskStatus::Failed);
                warn!(task_id = %task_id, error = %error, "task failed to start");
                return Err(GuardrailError::task_start(error.to_string()));
            }
        };

        entry.record.lock().set_status(TaskStatus::Running);
        info!(task_id = %task_id, units = units.len(), "task running");

        let engine = self.engine.clone();
        tokio::spawn(Self::supervise(engine, entry, units, models));
        Ok(())
    }

    /// Dispatch units in submission order, honoring the pause gate and the
    /// stop token before each not-yet-started unit
    async fn supervise(
        engine: Arc<FanoutEngine>,
        entry: Arc<TaskEntry>,
        units: Vec<EvaluationUnit>,
        models: HashMap<UnitId, ModelConfig>,
    ) {
        let semaphore = engine
            .max_in_flight()
            .map(|n| Arc::new(Semaphore::new(n.max(1))));
        let mut pause_rx = entry.pause.subscribe();

        for unit in units {
            // The concurrency permit is taken here, not in the unit task:
            // a unit waiting for capacity has not been dispatched yet and
            // must still observe a pause or stop issued in the meantime.
            let permit = match &semaphore {
                Some(sem) => {
                    let sem = sem.clone();
                    tokio::select! {
                        _ = entry.stop.cancelled() => {
                            debug!(unit_id = %unit.id, "stop requested, remaining units not dispatched");
                            return;
                        }
                        acquired = sem.acquire_owned() => match acquired {
                            Ok(permit) => Some(permit),
                            Err(_) => return,
                        },
                    }
                }
                None => None,
            };
            tokio::select! {
                _ = entry.stop.cancelled() => {
                    debug!(unit_id = %unit.id, "stop requested, remaining units not dispatched");
                    return;
                }
                changed = pause_rx.wait_for(|paused| !*paused) => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
            if entry.stop.is_cancelled() {
                return;
            }

            let model = models[&unit.id].clone();
            let engine = engine.clone();
            let entry = entry.clone();

            // Detached on purpose: a stopped task no longer waits on
            // stragglers, and their late outcomes are dropped at the record.
            tokio::spawn(async move {
                let _permit = permit;
                let outcome = engine.execute_unit(&unit, &model).await;

                let mut record = entry.record.lock();
                if record.record_outcome(unit.id.clone(), outcome) {
                    record.maybe_finalize();
                    if record.status == TaskStatus::Completed {
                        info!(task_id = %record.id, "task completed");
                    }
                }
            });
        }
    }

    /// Apply a control command
    ///
    /// Commands on the same task serialize through its record lock, so a
    /// racing pair resolves to one linear order. `stop` on an already
    /// COMPLETED task is a benign no-op.
    pub fn control(&self, task_id: &TaskId, action: ControlAction) -> GuardrailResult<()> {
        let entry = self.entry(task_id)?;
        let mut record = entry.record.lock();

        match (record.status, action) {
            (TaskStatus::Running, ControlAction::Pause) => {
                record.set_status(TaskStatus::Paused);
                entry.pause.send_replace(true);
                info!(task_id = %task_id, "task paused");
                Ok(())
            }
            (TaskStatus::Paused, ControlAction::Resume) => {
                record.set_status(TaskStatus::Running);
                entry.pause.send_replace(false);
                // Everything may already have settled while paused.
                record.maybe_finalize();
                info!(task_id = %task_id, status = %record.status, "task resumed");
                Ok(())
            }
            (TaskStatus::Running | TaskStatus::Paused, ControlAction::Stop) => {
                record.set_status(TaskStatus::Completed);
                entry.stop.cancel();
                info!(
                    task_id = %task_id,
                    settled = record.settled_count(),
                    total = record.units.len(),
                    "task stopped, finalized with collected results"
                );
                Ok(())
            }
            (TaskStatus::Completed, ControlAction::Stop) => Ok(()),
            (from, action) => Err(GuardrailError::InvalidTransition { from, action }),
        }
    }

    /// Snapshot of one task
    pub fn get_task(&self, task_id: &TaskId) -> GuardrailResult<Task> {
        let entry = self.entry(task_id)?;
        let record = entry.record.lock();
        Ok(record.clone())
    }

    /// Paginated task summaries, newest first
    ///
    /// Pages are 1-indexed; a zero page or page size is rejected.
    pub fn list_tasks(&self, page: usize, page_size: usize) -> GuardrailResult<Page<TaskSummary>> {
        if page == 0 {
            return Err(GuardrailError::validation("page is 1-indexed"));
        }
        if page_size == 0 {
            return Err(GuardrailError::validation("page_size must be positive"));
        }

        let mut summaries: Vec<TaskSummary> = self
            .tasks
            .iter()
            .map(|e| e.value().record.lock().summary())
            .collect();
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        let total = summaries.len();
        let items = summaries
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }
}
