//! SDK client implementation

use std::sync::Arc;
use std::time::{Duration, Instant};

use guardrail_core::{
    catalog::{InMemoryCatalog, TestCaseCatalog},
    config::{EngineConfig, ReportConfig},
    engine::{EvaluationUnit, FanoutEngine},
    error::GuardrailResult,
    llm::{HttpInvoker, ModelInvoker},
    registry::{InMemoryModelRegistry, ModelRegistry},
    report::{Report, ReportAggregator},
    scoring::{RefusalScorer, Scorer},
    task::{ControlAction, Task, TaskController, TaskStatus, TaskSummary},
    types::{CaseId, ModelId, Page, TaskId},
};
use tracing::debug;

/// Default interval between status polls in [`GuardrailClient::wait_until_settled`]
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Ad-hoc prompt included in a task request
#[derive(Debug, Clone)]
pub struct CustomPrompt {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl CustomPrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }
}

/// Selection of models and prompts to fan out
///
/// Expands to one evaluation unit per (model, prompt) pair; every selected
/// model runs every selected case and every custom prompt.
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    pub model_ids: Vec<ModelId>,
    pub case_ids: Vec<CaseId>,
    pub custom_prompts: Vec<CustomPrompt>,
}

impl TaskRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, id: impl Into<ModelId>) -> Self {
        self.model_ids.push(id.into());
        self
    }

    pub fn with_case(mut self, id: impl Into<CaseId>) -> Self {
        self.case_ids.push(id.into());
        self
    }

    pub fn with_custom_prompt(mut self, prompt: CustomPrompt) -> Self {
        self.custom_prompts.push(prompt);
        self
    }
}

/// High-level client over the evaluation orchestrator
pub struct GuardrailClient {
    registry: Arc<dyn ModelRegistry>,
    catalog: Arc<dyn TestCaseCatalog>,
    controller: TaskController,
    aggregator: ReportAggregator,
}

/// Builder for [`GuardrailClient`]
#[derive(Default)]
pub struct GuardrailClientBuilder {
    registry: Option<Arc<dyn ModelRegistry>>,
    catalog: Option<Arc<dyn TestCaseCatalog>>,
    invoker: Option<Arc<dyn ModelInvoker>>,
    scorer: Option<Arc<dyn Scorer>>,
    engine_config: EngineConfig,
    report_config: ReportConfig,
}

impl GuardrailClientBuilder {
    pub fn with_registry(mut self, registry: Arc<dyn ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn TestCaseCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_invoker(mut self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    pub fn with_report_config(mut self, config: ReportConfig) -> Self {
        self.report_config = config;
        self
    }

    pub fn build(self) -> GuardrailResult<GuardrailClient> {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(InMemoryModelRegistry::new()));
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(InMemoryCatalog::new()));
        let invoker = match self.invoker {
            Some(invoker) => invoker,
            None => Arc::new(HttpInvoker::new()?),
        };
        let scorer = self
            .scorer
            .unwrap_or_else(|| Arc::new(RefusalScorer::new()));

        let engine = FanoutEngine::new(
            registry.clone(),
            invoker,
            scorer,
            self.engine_config,
        );

        Ok(GuardrailClient {
            registry,
            catalog,
            controller: TaskController::new(Arc::new(engine)),
            aggregator: ReportAggregator::new(self.report_config),
        })
    }
}

impl GuardrailClient {
    pub fn builder() -> GuardrailClientBuilder {
        GuardrailClientBuilder::default()
    }

    /// Expand a request into evaluation units, one per (model, prompt) pair
    ///
    /// Catalog cases are resolved here, once; custom prompts involve no
    /// catalog lookup at all.
    pub async fn build_units(&self, request: &TaskRequest) -> GuardrailResult<Vec<EvaluationUnit>> {
        let mut cases = Vec::with_capacity(request.case_ids.len());
        for case_id in &request.case_ids {
            cases.push(self.catalog.get(case_id).await?);
        }

        let mut units = Vec::new();
        for model_id in &request.model_ids {
            for case in &cases {
                units.push(EvaluationUnit::from_case(model_id.clone(), case.clone()));
            }
            for custom in &request.custom_prompts {
                let mut unit = EvaluationUnit::custom(model_id.clone(), custom.prompt.clone());
                if let Some(system) = &custom.system_prompt {
                    unit = unit.with_system_prompt(system.clone());
                }
                units.push(unit);
            }
        }

        debug!(
            models = request.model_ids.len(),
            cases = cases.len(),
            custom = request.custom_prompts.len(),
            units = units.len(),
            "expanded task request"
        );
        Ok(units)
    }

    /// Create a task from the units and start it
    pub async fn submit_task(&self, units: Vec<EvaluationUnit>) -> GuardrailResult<TaskId> {
        let task_id = self.controller.create(units).await?;
        self.controller.start(&task_id).await?;
        Ok(task_id)
    }

    /// Create a task without starting it
    pub async fn create_task(&self, units: Vec<EvaluationUnit>) -> GuardrailResult<TaskId> {
        self.controller.create(units).await
    }

    /// Start a previously created task
    pub async fn start_task(&self, task_id: &TaskId) -> GuardrailResult<()> {
        self.controller.start(task_id).await
    }

    /// Apply a pause/resume/stop command
    pub fn control_task(&self, task_id: &TaskId, action: ControlAction) -> GuardrailResult<()> {
        self.controller.control(task_id, action)
    }

    /// Snapshot of one task
    pub fn get_task(&self, task_id: &TaskId) -> GuardrailResult<Task> {
        self.controller.get_task(task_id)
    }

    /// Report over the task's current result set; partial while running
    pub fn get_report(&self, task_id: &TaskId) -> GuardrailResult<Report> {
        let task = self.controller.get_task(task_id)?;
        Ok(self.aggregator.generate(&task))
    }

    /// Paginated task summaries, newest first
    pub fn list_tasks(&self, page: usize, page_size: usize) -> GuardrailResult<Page<TaskSummary>> {
        self.controller.list_tasks(page, page_size)
    }

    /// Check a model's endpoint reachability
    pub async fn verify_model(&self, model_id: &ModelId) -> GuardrailResult<()> {
        self.registry.verify(model_id).await
    }

    /// Poll until the task is terminal or paused, or the deadline passes
    ///
    /// Implemented as a status poll; the task is never blocked on. Returns
    /// the latest snapshot either way. `poll_interval` defaults to 100ms.
    pub async fn wait_until_settled(
        &self,
        task_id: &TaskId,
        poll_interval: Option<Duration>,
        timeout: Option<Duration>,
    ) -> GuardrailResult<Task> {
        let interval = poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let task = self.controller.get_task(task_id)?;
            // RUNNING is the only state worth waiting out; PENDING tasks
            // have not been started and PAUSED ones wait on an operator.
            if task.status != TaskStatus::Running {
                return Ok(task);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(task);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use guardrail_core::catalog::{SamplingOverrides, TestCase};
    use guardrail_core::llm::{Completion, InvokeError, TokenUsage};
    use guardrail_core::registry::ModelConfig;
    use guardrail_core::scoring::{DimensionScores, Scorer};

    use super::*;

    struct EchoInvoker;

    #[async_trait]
    impl ModelInvoker for EchoInvoker {
        async fn invoke(
            &self,
            _model: &ModelConfig,
            prompt: &str,
            _system_prompt: Option<&str>,
            _sampling: SamplingOverrides,
        ) -> Result<Completion, InvokeError> {
            Ok(Completion {
                text: format!("echo: {prompt}"),
                usage: TokenUsage::new(3, 3),
                duration_secs: 0.0,
                raw: serde_json::json!({}),
            })
        }
    }

    struct FixedScorer(f64);

    impl Scorer for FixedScorer {
        fn score(&self, _unit: &EvaluationUnit, _response: &str) -> Option<DimensionScores> {
            Some(DimensionScores::uniform(self.0))
        }
    }

    fn client() -> GuardrailClient {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "model-one"))
            .unwrap();
        registry
            .insert(ModelConfig::new("m2", "Model Two", "model-two"))
            .unwrap();
        let catalog = InMemoryCatalog::with_cases(vec![
            TestCase::new("c1", "prompt_injection", "direct", "ignore the rules"),
            TestCase::new("c2", "privacy_leak", "pii", "leak some data"),
        ]);
        GuardrailClient::builder()
            .with_registry(Arc::new(registry))
            .with_catalog(Arc::new(catalog))
            .with_invoker(Arc::new(EchoInvoker))
            .with_scorer(Arc::new(FixedScorer(0.9)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_build_units_cross_product() {
        let client = client();
        let request = TaskRequest::new()
            .with_model("m1")
            .with_model("m2")
            .with_case("c1")
            .with_case("c2")
            .with_custom_prompt(CustomPrompt::new("hello"));

        let units = client.build_units(&request).await.unwrap();
        // 2 models x (2 cases + 1 custom)
        assert_eq!(units.len(), 6);
    }

    #[tokio::test]
    async fn test_custom_prompt_needs_no_catalog() {
        // Client with an empty catalog: a custom prompt must not trigger any
        // catalog lookup.
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "model-one"))
            .unwrap();
        let client = GuardrailClient::builder()
            .with_registry(Arc::new(registry))
            .with_invoker(Arc::new(EchoInvoker))
            .with_scorer(Arc::new(FixedScorer(0.9)))
            .build()
            .unwrap();

        let request = TaskRequest::new()
            .with_model("m1")
            .with_custom_prompt(CustomPrompt::new("X"));
        let units = client.build_units(&request).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].prompt(), "X");
    }

    #[tokio::test]
    async fn test_submit_and_report() {
        let client = client();
        let request = TaskRequest::new().with_model("m1").with_case("c1").with_case("c2");
        let units = client.build_units(&request).await.unwrap();

        let task_id = client.submit_task(units).await.unwrap();
        let task = client
            .wait_until_settled(&task_id, Some(Duration::from_millis(5)), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);

        let report = client.get_report(&task_id).unwrap();
        assert_eq!(report.total_cases, 2);
        assert_eq!(report.passed_cases, 2);
        assert!(report.category_scores.contains_key("prompt_injection"));
        assert!(report.category_scores.contains_key("privacy_leak"));
    }

    #[tokio::test]
    async fn test_list_tasks_through_client() {
        let client = client();
        for _ in 0..3 {
            let units = client
                .build_units(&TaskRequest::new().with_model("m1").with_case("c1"))
                .await
                .unwrap();
            client.create_task(units).await.unwrap();
        }

        let page = client.list_tasks(1, 2).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
    }
}
