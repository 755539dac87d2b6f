// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing coordinator: thin glue over the analyzer, registry, and
//! cost tracker.
//!
//! One request flows validate -> analyze -> select -> budget pre-check
//! -> execute -> record. Budget rejections and provider failures are
//! structured fields on the outcome, never panics; a missing price
//! table is the only per-request fatal error. No lock is held across an
//! `.await`.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use switchyard_analyzer::{ContextAnalyzer, QueryAnalysis};
use switchyard_config::SwitchyardConfig;
use switchyard_core::types::{ProviderCall, RouteRequest, Tier, TokenUsage};
use switchyard_core::SwitchyardError;
use switchyard_cost::CostTracker;
use switchyard_registry::registry::RoutingInfo;
use switchyard_registry::{strategy, CapabilityRegistry};

/// Everything known about one routed request.
///
/// `error` is set for budget rejections, empty candidate sets, and
/// provider failures; the analysis and any routing decision are always
/// present for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOutcome {
    /// Response text, when execution succeeded.
    pub text: Option<String>,
    /// Selected provider name, when selection happened.
    pub provider: Option<String>,
    /// Tier of the selected provider.
    pub tier: Option<Tier>,
    /// Actual cost billed for this request, in USD.
    pub cost_usd: f64,
    /// The selection audit record, when selection happened.
    pub routing: Option<RoutingInfo>,
    /// The (context-adjusted) analysis that drove the decision.
    pub analysis: QueryAnalysis,
    /// What went wrong, when something did.
    pub error: Option<String>,
}

/// Thin glue over analyzer, registry, and cost tracker.
pub struct RoutingCoordinator {
    analyzer: ContextAnalyzer,
    registry: Arc<CapabilityRegistry>,
    tracker: Arc<CostTracker>,
    config: SwitchyardConfig,
}

impl RoutingCoordinator {
    /// Assemble a coordinator. The registry's strategy is set from the
    /// configured preset.
    pub fn new(
        config: SwitchyardConfig,
        registry: Arc<CapabilityRegistry>,
        tracker: Arc<CostTracker>,
    ) -> Self {
        if let Some(preset) = strategy::preset(&config.routing.strategy) {
            registry.set_strategy(preset);
        }
        Self {
            analyzer: ContextAnalyzer::new(config.analyzer.clone()),
            registry,
            tracker,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<CostTracker> {
        &self.tracker
    }

    /// Route one request end to end.
    ///
    /// Returns `Err` only for malformed input, session bookkeeping
    /// failures, or a missing price table; everything else is reported
    /// on the outcome.
    pub async fn route(
        &self,
        request: RouteRequest,
        session_id: Option<&str>,
    ) -> Result<RouteOutcome, SwitchyardError> {
        if request.prompt.trim().is_empty() {
            return Err(SwitchyardError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let analysis = self
            .analyzer
            .analyze_with_context(&request.prompt, request.conversation.as_ref());

        let Some((provider, routing)) = self
            .registry
            .find_best_with_routing(&request, Some(&analysis))
        else {
            warn!(task = %request.task_type, "no eligible provider");
            return Ok(RouteOutcome {
                text: None,
                provider: None,
                tier: None,
                cost_usd: 0.0,
                routing: None,
                analysis,
                error: Some(format!(
                    "no eligible provider for task `{}`",
                    request.task_type
                )),
            });
        };

        let descriptor = provider.descriptor();

        if let Some(id) = session_id
            && self.tracker.get_session(id).is_none()
        {
            self.tracker.start_session(id)?;
        }

        let estimated_tokens = self.estimate_tokens(&request.prompt);
        let check =
            self.tracker
                .pre_request_check(session_id, &descriptor.name, &estimated_tokens)?;
        for warning in &check.warnings {
            warn!(provider = %descriptor.name, %warning, "budget warning");
        }

        if !check.approved {
            let reason = check
                .reason
                .unwrap_or_else(|| "budget check rejected the request".to_string());
            warn!(provider = %descriptor.name, %reason, "request rejected before execution");
            return Ok(RouteOutcome {
                text: None,
                provider: Some(descriptor.name),
                tier: Some(descriptor.tier),
                cost_usd: 0.0,
                routing: Some(routing),
                analysis,
                error: Some(reason),
            });
        }

        let call = ProviderCall {
            prompt: request.prompt.clone(),
            task_type: request.task_type,
            max_tokens: self.config.routing.estimated_output_tokens,
        };

        let started = Instant::now();
        let result = provider.execute(call).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                let actual_cost = self
                    .tracker
                    .pricing()
                    .estimate(&descriptor.name, &outcome.usage)?
                    .total_usd;
                self.tracker.post_request(
                    session_id,
                    &descriptor.name,
                    check.estimated_cost,
                    &outcome.usage,
                    actual_cost,
                    true,
                    latency_ms,
                )?;
                self.registry
                    .update_metrics(&descriptor.name, true, latency_ms, actual_cost, None);

                info!(
                    provider = %descriptor.name,
                    tier = %descriptor.tier,
                    cost_usd = actual_cost,
                    latency_ms,
                    "request routed"
                );

                Ok(RouteOutcome {
                    text: Some(outcome.text),
                    provider: Some(descriptor.name),
                    tier: Some(descriptor.tier),
                    cost_usd: actual_cost,
                    routing: Some(routing),
                    analysis,
                    error: None,
                })
            }
            Err(failure) => {
                // Partial usage from a failed call is billed as actual
                // usage.
                let usage = failure.partial_usage.unwrap_or_default();
                let actual_cost = self
                    .tracker
                    .pricing()
                    .estimate(&descriptor.name, &usage)?
                    .total_usd;
                self.tracker.post_request(
                    session_id,
                    &descriptor.name,
                    check.estimated_cost,
                    &usage,
                    actual_cost,
                    false,
                    latency_ms,
                )?;
                self.registry.update_metrics(
                    &descriptor.name,
                    false,
                    latency_ms,
                    actual_cost,
                    failure.error_code.as_deref(),
                );

                warn!(
                    provider = %descriptor.name,
                    error = %failure.message,
                    cost_usd = actual_cost,
                    "provider execution failed"
                );

                Ok(RouteOutcome {
                    text: None,
                    provider: Some(descriptor.name),
                    tier: Some(descriptor.tier),
                    cost_usd: actual_cost,
                    routing: Some(routing),
                    analysis,
                    error: Some(failure.message),
                })
            }
        }
    }

    /// Route a batch with bounded concurrency.
    ///
    /// Results come back in input order; one failed request never
    /// aborts the rest.
    pub async fn route_batch(
        &self,
        requests: Vec<RouteRequest>,
        session_id: Option<&str>,
        max_concurrency: Option<usize>,
    ) -> Vec<Result<RouteOutcome, SwitchyardError>> {
        let limit = max_concurrency
            .unwrap_or(self.config.runtime.max_concurrency)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        let futures = requests.into_iter().map(|request| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("batch semaphore is never closed");
                self.route(request, session_id).await
            }
        });

        join_all(futures).await
    }

    /// Rough token estimate from prompt length for the pre-check.
    fn estimate_tokens(&self, prompt: &str) -> TokenUsage {
        let chars_per_token = self.config.routing.chars_per_token.max(1);
        let input = prompt.chars().count() as u32 / chars_per_token;
        TokenUsage {
            input_tokens: input.max(1),
            output_tokens: self.config.routing.estimated_output_tokens,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use switchyard_core::types::{
        ExecutionFailure, ExecutionOutcome, HealthStatus, ProviderDescriptor, ProviderDetail,
        TaskType,
    };
    use switchyard_core::CapabilityProvider;
    use switchyard_cost::{ModelPricing, PricingBook};

    struct EchoProvider {
        name: String,
        tier: Tier,
        fail: bool,
        calls: AtomicUsize,
    }

    impl EchoProvider {
        fn new(name: &str, tier: Tier) -> Self {
            Self {
                name: name.to_string(),
                tier,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &str, tier: Tier) -> Self {
            Self {
                fail: true,
                ..Self::new(name, tier)
            }
        }
    }

    #[async_trait]
    impl CapabilityProvider for EchoProvider {
        fn descriptor(&self) -> ProviderDescriptor {
            ProviderDescriptor {
                name: self.name.clone(),
                version: semver::Version::new(0, 1, 0),
                tier: self.tier,
                supported_tasks: vec![TaskType::General],
                capabilities: vec!["general".into()],
                detail: ProviderDetail::Llm {
                    vendor: "test".into(),
                    model_id: self.name.clone(),
                },
            }
        }

        async fn execute(&self, call: ProviderCall) -> Result<ExecutionOutcome, ExecutionFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExecutionFailure {
                    message: "backend unavailable".into(),
                    error_code: Some("unavailable".into()),
                    partial_usage: Some(TokenUsage {
                        input_tokens: 40,
                        ..Default::default()
                    }),
                });
            }
            Ok(ExecutionOutcome {
                text: format!("echo: {}", call.prompt),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 200,
                    ..Default::default()
                },
                latency_ms: 1,
            })
        }

        async fn health_check(&self) -> Result<HealthStatus, SwitchyardError> {
            Ok(HealthStatus::Healthy)
        }

        async fn usage_stats(&self) -> Result<serde_json::Value, SwitchyardError> {
            Ok(serde_json::json!({}))
        }
    }

    fn coordinator_with(providers: Vec<EchoProvider>) -> RoutingCoordinator {
        let config = SwitchyardConfig::default();
        let registry = Arc::new(CapabilityRegistry::new());
        let pricing = PricingBook::new();
        for provider in providers {
            pricing.register(
                &provider.name,
                ModelPricing {
                    input_per_1k: 0.003,
                    output_per_1k: 0.015,
                    cached_per_1k: 0.0,
                    reasoning_per_1k: 0.0,
                    minimum_charge: None,
                    free_tier_tokens: None,
                },
            );
            registry.register(Arc::new(provider));
        }
        let tracker = Arc::new(CostTracker::new(config.budget.clone(), pricing));
        RoutingCoordinator::new(config, registry, tracker)
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let coordinator = coordinator_with(vec![EchoProvider::new("alpha", Tier::Standard)]);
        let err = coordinator
            .route(RouteRequest::new("   "), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchyardError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn no_candidates_yields_outcome_with_error() {
        let coordinator = coordinator_with(Vec::new());
        let outcome = coordinator
            .route(RouteRequest::new("hello"), None)
            .await
            .unwrap();
        assert!(outcome.provider.is_none());
        assert!(outcome.text.is_none());
        assert_eq!(outcome.cost_usd, 0.0);
        assert!(outcome.error.as_deref().unwrap().contains("no eligible provider"));
    }

    #[tokio::test]
    async fn successful_route_bills_actual_usage() {
        let coordinator = coordinator_with(vec![EchoProvider::new("alpha", Tier::Standard)]);
        let outcome = coordinator
            .route(RouteRequest::new("summarize this paragraph"), None)
            .await
            .unwrap();
        assert_eq!(outcome.provider.as_deref(), Some("alpha"));
        assert_eq!(outcome.tier, Some(Tier::Standard));
        assert_eq!(outcome.text.as_deref(), Some("echo: summarize this paragraph"));
        // 100 input at 0.003/1k plus 200 output at 0.015/1k.
        assert!((outcome.cost_usd - 0.0033).abs() < 1e-9);
        assert!(outcome.error.is_none());
        assert!(outcome.routing.is_some());

        let metrics = coordinator.registry().metrics("alpha").unwrap();
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.successful_requests, 1);
    }

    #[tokio::test]
    async fn failed_execution_bills_partial_usage() {
        let coordinator = coordinator_with(vec![EchoProvider::failing("flaky", Tier::Economy)]);
        let outcome = coordinator
            .route(RouteRequest::new("hello there"), None)
            .await
            .unwrap();
        assert_eq!(outcome.error.as_deref(), Some("backend unavailable"));
        assert!(outcome.text.is_none());
        // 40 partial input tokens at 0.003/1k.
        assert!((outcome.cost_usd - 0.00012).abs() < 1e-9);

        let metrics = coordinator.registry().metrics("flaky").unwrap();
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.last_error.as_deref(), Some("unavailable"));
    }

    #[tokio::test]
    async fn batch_results_keep_input_order() {
        let coordinator = coordinator_with(vec![EchoProvider::new("alpha", Tier::Standard)]);
        let requests: Vec<RouteRequest> = (0..5)
            .map(|i| RouteRequest::new(format!("request number {i}")))
            .collect();

        let results = coordinator.route_batch(requests, None, Some(2)).await;

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            let outcome = result.as_ref().unwrap();
            assert_eq!(
                outcome.text.as_deref(),
                Some(format!("echo: request number {i}").as_str())
            );
        }
    }

    #[tokio::test]
    async fn session_is_started_lazily() {
        let coordinator = coordinator_with(vec![EchoProvider::new("alpha", Tier::Standard)]);
        assert!(coordinator.tracker().get_session("s-1").is_none());

        coordinator
            .route(RouteRequest::new("hello"), Some("s-1"))
            .await
            .unwrap();

        let session = coordinator.tracker().get_session("s-1").unwrap();
        assert_eq!(session.total_requests, 1);
    }
}
