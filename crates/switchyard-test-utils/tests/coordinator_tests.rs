// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete routing pipeline.
//!
//! Each test creates an isolated TestHarness with mock providers and an
//! in-memory cost tracker. Tests are independent and order-insensitive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use switchyard_config::{BudgetConfig, SwitchyardConfig};
use switchyard_coordinator::RoutingCoordinator;
use switchyard_core::types::{
    ExecutionFailure, ExecutionOutcome, HealthStatus, ProviderCall, ProviderDescriptor,
    ProviderDetail, RouteRequest, TaskType, Tier, TokenUsage,
};
use switchyard_core::{CapabilityProvider, SwitchyardError};
use switchyard_cost::{CostTracker, PricingBook};
use switchyard_registry::CapabilityRegistry;
use switchyard_test_utils::{
    standard_pricing, MockCapabilityProvider, ScriptedResponse, TestHarness,
};

// ---- Test 1: happy path ----

#[tokio::test]
async fn routed_request_returns_scripted_text_and_cost() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![ScriptedResponse::Success {
            text: "Hello from Switchyard!".to_string(),
            usage: TokenUsage {
                input_tokens: 1000,
                output_tokens: 2000,
                ..Default::default()
            },
            latency_ms: 3,
        }])
        .build();

    let outcome = harness.route("Hi there").await.unwrap();
    assert_eq!(outcome.text.as_deref(), Some("Hello from Switchyard!"));
    assert_eq!(outcome.provider.as_deref(), Some("mock-provider"));
    assert_eq!(outcome.tier, Some(Tier::Standard));
    // 1000 input at 0.003/1k plus 2000 output at 0.015/1k.
    assert!((outcome.cost_usd - 0.033).abs() < 1e-9);
    assert!(outcome.error.is_none());
    assert!(outcome.routing.is_some());
}

// ---- Test 2: budget rejection happens before execution ----

#[tokio::test]
async fn per_request_cap_rejects_without_calling_provider() {
    let harness = TestHarness::builder()
        .with_budget(BudgetConfig {
            per_request_cap_usd: Some(0.000_001),
            ..BudgetConfig::default()
        })
        .build();

    let outcome = harness.route("an expensive request").await.unwrap();
    assert!(outcome.text.is_none());
    assert!(outcome.error.is_some());
    assert_eq!(outcome.provider.as_deref(), Some("mock-provider"));
    assert!(outcome.routing.is_some());
    assert_eq!(outcome.cost_usd, 0.0);
    assert_eq!(harness.mock.call_count(), 0);
}

// ---- Test 3: provider failures bill partial usage ----

#[tokio::test]
async fn failed_execution_bills_partial_usage_and_reports_error() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![ScriptedResponse::Failure {
            message: "rate limited".to_string(),
            error_code: Some("429".to_string()),
            partial_usage: Some(TokenUsage {
                input_tokens: 1000,
                ..Default::default()
            }),
        }])
        .build();

    let outcome = harness.route("please fail").await.unwrap();
    assert_eq!(outcome.error.as_deref(), Some("rate limited"));
    assert!(outcome.text.is_none());
    // 1000 partial input tokens at 0.003/1k.
    assert!((outcome.cost_usd - 0.003).abs() < 1e-9);

    let metrics = harness.registry.metrics("mock-provider").unwrap();
    assert_eq!(metrics.failed_requests, 1);
    assert_eq!(metrics.last_error.as_deref(), Some("429"));
    assert_eq!(harness.tracker.log().len(), 1);
}

// ---- Test 4: batch routing keeps input order ----

#[tokio::test]
async fn batch_of_five_at_concurrency_two_preserves_order() {
    let responses = (0..5)
        .map(|i| ScriptedResponse::text(format!("answer {i}")))
        .collect();
    let harness = TestHarness::builder().with_mock_responses(responses).build();

    let requests: Vec<RouteRequest> = (0..5)
        .map(|i| RouteRequest::new(format!("question number {i}")))
        .collect();
    let results = harness
        .coordinator
        .route_batch(requests, None, Some(2))
        .await;

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        let outcome = result.as_ref().unwrap();
        assert_eq!(
            outcome.text.as_deref(),
            Some(format!("answer {i}").as_str())
        );
    }
    assert_eq!(harness.mock.call_count(), 5);
}

// ---- Test 5: forced tier bypasses strategy ranking ----

#[tokio::test]
async fn forced_tier_selects_within_that_tier() {
    let harness = TestHarness::builder()
        .with_provider(
            MockCapabilityProvider::new("frontier-model", Tier::Frontier),
            standard_pricing(),
        )
        .build();

    let request = RouteRequest::new("trivial question").with_forced_tier(Tier::Frontier);
    let outcome = harness.coordinator.route(request, None).await.unwrap();
    assert_eq!(outcome.provider.as_deref(), Some("frontier-model"));
    assert_eq!(outcome.tier, Some(Tier::Frontier));
}

// ---- Test 6: unsupported task yields an error outcome, not an Err ----

#[tokio::test]
async fn unsupported_task_reports_no_eligible_provider() {
    let harness = TestHarness::builder().build();

    let request = RouteRequest::new("transfer this file").with_task_type(TaskType::FileTransfer);
    let outcome = harness.coordinator.route(request, None).await.unwrap();
    assert!(outcome.provider.is_none());
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("no eligible provider"));
    assert_eq!(harness.mock.call_count(), 0);
}

// ---- Test 7: sessions accumulate usage across requests ----

#[tokio::test]
async fn session_accumulates_across_requests() {
    let harness = TestHarness::builder().build();

    harness.route_in_session("first", "sess-1").await.unwrap();
    harness.route_in_session("second", "sess-1").await.unwrap();

    let session = harness.tracker.get_session("sess-1").unwrap();
    assert_eq!(session.total_requests, 2);
    assert_eq!(session.successful_requests, 2);
    assert!(session.actual_cost_usd > 0.0);
}

// ---- Test 8: session cap stops a runaway session ----

#[tokio::test]
async fn per_session_cap_rejects_once_exhausted() {
    // Pre-check estimates ~0.01536 USD per request (1024 estimated
    // output tokens at 0.015/1k); the first request fits under the cap,
    // the second does not once the first's 0.00033 USD actual cost is
    // on the session.
    let harness = TestHarness::builder()
        .with_budget(BudgetConfig {
            per_session_cap_usd: Some(0.0155),
            ..BudgetConfig::default()
        })
        .build();

    let first = harness.route_in_session("one", "sess-2").await.unwrap();
    assert!(first.error.is_none());

    let second = harness.route_in_session("two", "sess-2").await.unwrap();
    assert!(second.error.is_some());
    assert_eq!(harness.mock.call_count(), 1);
}

// ---- Test 9: batch concurrency never exceeds the cap ----

/// Provider that sleeps in `execute` and records the high-water mark of
/// concurrent calls.
struct SlowProvider {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl SlowProvider {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CapabilityProvider for SlowProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: "slow-provider".to_string(),
            version: semver::Version::new(0, 1, 0),
            tier: Tier::Standard,
            supported_tasks: vec![TaskType::General],
            capabilities: vec!["general".to_string()],
            detail: ProviderDetail::Llm {
                vendor: "mock".to_string(),
                model_id: "slow-provider".to_string(),
            },
        }
    }

    async fn execute(&self, call: ProviderCall) -> Result<ExecutionOutcome, ExecutionFailure> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ExecutionOutcome {
            text: format!("done: {}", call.prompt),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
                ..Default::default()
            },
            latency_ms: 20,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchyardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn usage_stats(&self) -> Result<serde_json::Value, SwitchyardError> {
        Ok(serde_json::json!({}))
    }
}

#[tokio::test]
async fn batch_holds_at_most_two_requests_in_flight() {
    let config = SwitchyardConfig::default();
    let pricing = PricingBook::new();
    pricing.register("slow-provider", standard_pricing());
    let provider = Arc::new(SlowProvider::new());
    let registry = Arc::new(CapabilityRegistry::new());
    registry.register(provider.clone());
    let tracker = Arc::new(CostTracker::new(config.budget.clone(), pricing));
    let coordinator = RoutingCoordinator::new(config, registry, tracker);

    let requests: Vec<RouteRequest> = (0..5)
        .map(|i| RouteRequest::new(format!("job {i}")))
        .collect();
    let results = coordinator.route_batch(requests, None, Some(2)).await;

    for (i, result) in results.iter().enumerate() {
        let outcome = result.as_ref().unwrap();
        assert_eq!(outcome.text.as_deref(), Some(format!("done: job {i}").as_str()));
    }
    let high_water = provider.high_water.load(Ordering::SeqCst);
    assert!(high_water <= 2, "saw {high_water} concurrent calls");
    assert_eq!(high_water, 2);
}

// ---- Test 10: context escalation steers selection to higher tiers ----

#[tokio::test]
async fn escalating_conversation_prefers_stronger_tier() {
    let harness = TestHarness::builder()
        .with_strategy("cost-optimized")
        .with_provider(
            MockCapabilityProvider::new("advanced-model", Tier::Advanced),
            standard_pricing(),
        )
        .build();

    let conversation = switchyard_core::types::ConversationContext {
        exchanges: vec![
            switchyard_core::types::Exchange {
                response_text: "Short.".to_string(),
                error: None,
                tier: Some(Tier::Economy),
            },
            switchyard_core::types::Exchange {
                response_text: "Brief.".to_string(),
                error: None,
                tier: Some(Tier::Economy),
            },
        ],
        turn_count: 3,
        summary: None,
        complexity_hint: None,
    };

    // Repeated escalation vocabulary plus a long query after a short
    // response pushes escalation past the override threshold.
    let prompt = "Please explain in detail and go deeper, explain why this \
                  design behaves the way it does and elaborate on every part";
    let request = RouteRequest::new(prompt).with_conversation(conversation);
    let outcome = harness.coordinator.route(request, None).await.unwrap();

    assert_eq!(outcome.provider.as_deref(), Some("advanced-model"));
    let factors = outcome.analysis.context_factors.unwrap();
    assert!(factors.complexity_escalation > 1.5);
}
