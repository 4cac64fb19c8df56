//! Concurrent dispatch of evaluation units

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::outcome::{EvaluationResult, UnitFailure, UnitOutcome};
use super::unit::EvaluationUnit;
use crate::config::EngineConfig;
use crate::error::{GuardrailError, GuardrailResult};
use crate::llm::ModelInvoker;
use crate::registry::{ModelConfig, ModelRegistry};
use crate::scoring::Scorer;
use crate::types::{ModelId, UnitId};

/// Evaluation fan-out engine
///
/// Dispatches all units of a batch concurrently and waits for every one to
/// settle. One unit's failure never aborts its siblings; the returned set
/// carries exactly one outcome per submitted unit, paired by unit id.
pub struct FanoutEngine {
    registry: Arc<dyn ModelRegistry>,
    invoker: Arc<dyn ModelInvoker>,
    scorer: Arc<dyn Scorer>,
    config: EngineConfig,
}

impl FanoutEngine {
    pub fn new(
        registry: Arc<dyn ModelRegistry>,
        invoker: Arc<dyn ModelInvoker>,
        scorer: Arc<dyn Scorer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            invoker,
            scorer,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<dyn ModelRegistry> {
        &self.registry
    }

    /// Configured in-flight cap, if any
    pub fn max_in_flight(&self) -> Option<usize> {
        self.config.max_in_flight
    }

    /// Validate a batch before any remote call is issued
    ///
    /// Checks that the batch is non-empty, that every unit resolves to a
    /// concrete prompt, and that every referenced model exists in the
    /// registry. Returns the resolved model config per unit id.
    pub async fn validate(
        &self,
        units: &[EvaluationUnit],
    ) -> GuardrailResult<HashMap<UnitId, ModelConfig>> {
        if units.is_empty() {
            return Err(GuardrailError::validation("unit set is empty"));
        }

        for unit in units {
            unit.validate()?;
        }

        // Resolve each distinct model once.
        let mut models: HashMap<ModelId, ModelConfig> = HashMap::new();
        for unit in units {
            if !models.contains_key(&unit.model_id) {
                let model = self.registry.get(&unit.model_id).await?;
                models.insert(unit.model_id.clone(), model);
            }
        }

        Ok(units
            .iter()
            .map(|u| (u.id.clone(), models[&u.model_id].clone()))
            .collect())
    }

    /// Execute a batch, returning one outcome per unit
    ///
    /// All units are dispatched concurrently, bounded only by the configured
    /// `max_in_flight`. The call returns once every unit has settled.
    pub async fn evaluate(
        &self,
        units: Vec<EvaluationUnit>,
    ) -> GuardrailResult<Vec<(EvaluationUnit, UnitOutcome)>> {
        let models = self.validate(&units).await?;
        let limit = self.config.max_in_flight.unwrap_or(units.len()).max(1);

        debug!(units = units.len(), limit, "fanning out evaluation batch");

        let outcomes = stream::iter(units.into_iter().map(|unit| {
            let model = models[&unit.id].clone();
            async move {
                let outcome = self.execute_unit(&unit, &model).await;
                (unit, outcome)
            }
        }))
        .buffer_unordered(limit)
        .collect::<Vec<_>>()
        .await;

        Ok(outcomes)
    }

    /// Execute one unit against its resolved model, applying retry policy
    /// and scoring
    ///
    /// Never returns an error: remote failures are absorbed into a
    /// [`UnitOutcome::Failed`] record.
    pub async fn execute_unit(&self, unit: &EvaluationUnit, model: &ModelConfig) -> UnitOutcome {
        let attempts = 1 + self.config.retry_attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self
                .invoker
                .invoke(model, unit.prompt(), unit.system_prompt(), unit.sampling())
                .await
            {
                Ok(completion) => {
                    let scores = self.scorer.score(unit, &completion.text);
                    debug!(
                        unit_id = %unit.id,
                        model = %model.id,
                        duration_secs = completion.duration_secs,
                        "unit completed"
                    );
                    return UnitOutcome::Completed(EvaluationResult::from_completion(
                        model, completion, scores,
                    ));
                }
                Err(error) => {
                    warn!(
                        unit_id = %unit.id,
                        model = %model.id,
                        attempt,
                        error = %error,
                        "unit attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        // attempts >= 1, so last_error is always set here
        let error = last_error.unwrap_or_else(|| {
            crate::llm::InvokeError::Transport("no attempt was made".to_string())
        });
        UnitOutcome::Failed(UnitFailure::from_error(unit.model_id.clone(), &error))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::catalog::SamplingOverrides;
    use crate::llm::{Completion, InvokeError, TokenUsage};
    use crate::registry::InMemoryModelRegistry;
    use crate::scoring::{DimensionScores, RefusalScorer};

    /// Invoker that fails for models whose id contains "bad"
    struct FakeInvoker {
        calls: AtomicU32,
    }

    impl FakeInvoker {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelInvoker for FakeInvoker {
        async fn invoke(
            &self,
            model: &ModelConfig,
            prompt: &str,
            _system_prompt: Option<&str>,
            _sampling: SamplingOverrides,
        ) -> Result<Completion, InvokeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if model.id.as_str().contains("bad") {
                return Err(InvokeError::Transport("connection refused".to_string()));
            }
            Ok(Completion {
                text: format!("echo: {prompt}"),
                usage: TokenUsage::new(10, 5),
                duration_secs: 0.01,
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

    fn engine_with(config: EngineConfig) -> (FanoutEngine, Arc<FakeInvoker>) {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "model-one"))
            .unwrap();
        registry
            .insert(ModelConfig::new("bad", "Broken", "model-bad"))
            .unwrap();
        let invoker = Arc::new(FakeInvoker::new());
        let engine = FanoutEngine::new(
            Arc::new(registry),
            invoker.clone(),
            Arc::new(RefusalScorer::new()),
            config,
        );
        (engine, invoker)
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (engine, _) = engine_with(EngineConfig::default());
        let result = engine.evaluate(Vec::new()).await;
        assert!(matches!(result, Err(GuardrailError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_model_fails_fast() {
        let (engine, invoker) = engine_with(EngineConfig::default());
        let units = vec![
            EvaluationUnit::custom(ModelId::new("m1"), "hello"),
            EvaluationUnit::custom(ModelId::new("ghost"), "hello"),
        ];
        let result = engine.evaluate(units).await;
        assert!(matches!(result, Err(GuardrailError::NotFound { .. })));
        // Validation failed before any remote call.
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_outcome_per_unit_with_mixed_results() {
        let (engine, _) = engine_with(EngineConfig::default());
        let units: Vec<_> = (0..4)
            .map(|i| {
                let model = if i == 2 { "bad" } else { "m1" };
                EvaluationUnit::custom(ModelId::new(model), format!("prompt {i}"))
            })
            .collect();
        let submitted: HashSet<UnitId> = units.iter().map(|u| u.id.clone()).collect();

        let outcomes = engine.evaluate(units).await.unwrap();

        assert_eq!(outcomes.len(), 4);
        let returned: HashSet<UnitId> = outcomes.iter().map(|(u, _)| u.id.clone()).collect();
        assert_eq!(returned, submitted);

        let failures = outcomes.iter().filter(|(_, o)| o.is_failure()).count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_retry_attempts_are_applied() {
        let (engine, invoker) = engine_with(EngineConfig::new().with_retry_attempts(2));
        let units = vec![EvaluationUnit::custom(ModelId::new("bad"), "hello")];

        let outcomes = engine.evaluate(units).await.unwrap();
        assert!(outcomes[0].1.is_failure());
        // 1 initial + 2 retries
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 3);
    }

    /// Invoker that records the peak number of simultaneous calls
    struct ConcurrencyProbeInvoker {
        in_flight: AtomicU32,
        peak: AtomicU32,
    }

    impl ConcurrencyProbeInvoker {
        fn new() -> Self {
            Self {
                in_flight: AtomicU32::new(0),
                peak: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelInvoker for ConcurrencyProbeInvoker {
        async fn invoke(
            &self,
            _model: &ModelConfig,
            prompt: &str,
            _system_prompt: Option<&str>,
            _sampling: SamplingOverrides,
        ) -> Result<Completion, InvokeError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Completion {
                text: format!("echo: {prompt}"),
                usage: TokenUsage::new(10, 5),
                duration_secs: 0.01,
                raw: serde_json::json!({}),
            })
        }
    }

    #[tokio::test]
    async fn test_max_in_flight_caps_concurrency() {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "model-one"))
            .unwrap();
        let invoker = Arc::new(ConcurrencyProbeInvoker::new());
        let engine = FanoutEngine::new(
            Arc::new(registry),
            invoker.clone(),
            Arc::new(RefusalScorer::new()),
            EngineConfig::new().with_max_in_flight(2),
        );

        let units: Vec<_> = (0..6)
            .map(|i| EvaluationUnit::custom(ModelId::new("m1"), format!("prompt {i}")))
            .collect();
        let outcomes = engine.evaluate(units).await.unwrap();

        assert_eq!(outcomes.len(), 6);
        assert!(invoker.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_scorer_attaches_scores() {
        let registry = InMemoryModelRegistry::new();
        registry
            .insert(ModelConfig::new("m1", "Model One", "model-one"))
            .unwrap();
        let engine = FanoutEngine::new(
            Arc::new(registry),
            Arc::new(FakeInvoker::new()),
            Arc::new(FixedScorer(0.8)),
            EngineConfig::default(),
        );

        let units = vec![EvaluationUnit::custom(ModelId::new("m1"), "hello")];
        let outcomes = engine.evaluate(units).await.unwrap();
        let scores = outcomes[0].1.scores().unwrap();
        assert_eq!(scores.safety, Some(0.8));
    }
}
