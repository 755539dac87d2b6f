// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end routing tests.
//!
//! `TestHarness` assembles a complete routing stack with mock providers,
//! an in-memory cost tracker, and a coordinator. Provides `route()` to
//! drive the full pipeline in tests.

use std::sync::Arc;

use switchyard_config::{BudgetConfig, SwitchyardConfig};
use switchyard_coordinator::{RouteOutcome, RoutingCoordinator};
use switchyard_core::types::{RouteRequest, Tier};
use switchyard_core::{CapabilityProvider, SwitchyardError};
use switchyard_cost::{CostTracker, ModelPricing, PricingBook};
use switchyard_registry::CapabilityRegistry;

use crate::mock_provider::{MockCapabilityProvider, ScriptedResponse};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<ScriptedResponse>,
    budget: Option<BudgetConfig>,
    strategy: Option<String>,
    pricing: ModelPricing,
    extra_providers: Vec<(MockCapabilityProvider, ModelPricing)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            budget: None,
            strategy: None,
            pricing: standard_pricing(),
            extra_providers: Vec::new(),
        }
    }

    /// Script the default mock provider's response queue.
    pub fn with_mock_responses(mut self, responses: Vec<ScriptedResponse>) -> Self {
        self.responses = responses;
        self
    }

    /// Set the budget configuration for the test environment.
    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Set a daily budget cap, leaving the rest of the budget defaults.
    pub fn with_daily_cap(mut self, daily_usd: f64) -> Self {
        let mut budget = self.budget.unwrap_or_default();
        budget.daily_cap_usd = Some(daily_usd);
        self.budget = Some(budget);
        self
    }

    /// Select a strategy preset by name.
    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = Some(strategy.to_string());
        self
    }

    /// Override the default mock provider's pricing.
    pub fn with_pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Register an additional provider with its own pricing.
    pub fn with_provider(
        mut self,
        provider: MockCapabilityProvider,
        pricing: ModelPricing,
    ) -> Self {
        self.extra_providers.push((provider, pricing));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub fn build(self) -> TestHarness {
        let mut config = SwitchyardConfig::default();
        if let Some(strategy) = self.strategy {
            config.routing.strategy = strategy;
        }
        if let Some(budget) = self.budget {
            config.budget = budget;
        }

        let pricing_book = PricingBook::new();
        pricing_book.register("mock-provider", self.pricing);

        let mock = Arc::new(
            MockCapabilityProvider::new("mock-provider", Tier::Standard)
                .with_responses(self.responses),
        );

        let registry = Arc::new(CapabilityRegistry::new());
        registry.register(mock.clone());
        for (provider, pricing) in self.extra_providers {
            pricing_book.register(&provider.descriptor().name, pricing);
            registry.register(Arc::new(provider));
        }

        let tracker = Arc::new(CostTracker::new(config.budget.clone(), pricing_book));
        let coordinator =
            RoutingCoordinator::new(config.clone(), registry.clone(), tracker.clone());

        TestHarness {
            mock,
            registry,
            tracker,
            coordinator,
            config,
        }
    }
}

/// A complete test environment: mock providers, registry, tracker, and
/// a coordinator wired together.
pub struct TestHarness {
    /// The default mock provider, registered as "mock-provider".
    pub mock: Arc<MockCapabilityProvider>,
    /// The provider registry.
    pub registry: Arc<CapabilityRegistry>,
    /// The cost tracker.
    pub tracker: Arc<CostTracker>,
    /// The assembled coordinator.
    pub coordinator: RoutingCoordinator,
    /// The configuration the stack was built from.
    pub config: SwitchyardConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Route one prompt through the full pipeline without a session.
    pub async fn route(&self, prompt: &str) -> Result<RouteOutcome, SwitchyardError> {
        self.coordinator.route(RouteRequest::new(prompt), None).await
    }

    /// Route one prompt within the given session.
    pub async fn route_in_session(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> Result<RouteOutcome, SwitchyardError> {
        self.coordinator
            .route(RouteRequest::new(prompt), Some(session_id))
            .await
    }
}

/// Pricing used for mock providers unless overridden.
pub fn standard_pricing() -> ModelPricing {
    ModelPricing {
        input_per_1k: 0.003,
        output_per_1k: 0.015,
        cached_per_1k: 0.0003,
        reasoning_per_1k: 0.015,
        minimum_charge: None,
        free_tier_tokens: None,
    }
}
