// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability registry: live provider map, per-provider metrics,
//! and strategy-driven selection.
//!
//! The registry is an explicitly constructed, dependency-injected
//! service. Selection works over a snapshot of the live map, so
//! registering or unregistering mid-flight never corrupts a concurrent
//! selection; at worst a just-removed provider serves one more request.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use switchyard_analyzer::{ContextFactors, QueryAnalysis};
use switchyard_core::types::{ProviderDescriptor, RouteRequest, TaskType};
use switchyard_core::{CapabilityProvider, SwitchyardError};

use crate::metrics::ProviderMetrics;
use crate::strategy::{Balanced, Candidate, SelectionStrategy};

/// Escalation amounts above this prefer tier >= 2 providers.
const ESCALATION_OVERRIDE_THRESHOLD: f64 = 1.5;

/// The audit record produced for every selection.
///
/// Produced fresh per selection; never persisted by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingInfo {
    /// Name of the selected provider.
    pub provider: String,
    /// Human-readable reasoning for the selection.
    pub reason: String,
    /// Names of the other eligible candidates.
    pub alternatives: Vec<String>,
    /// Wall-clock time the selection took, in milliseconds.
    pub selection_latency_ms: f64,
    /// Observed average cost per request of the selected provider, if
    /// it has served any traffic.
    pub estimated_cost_usd: Option<f64>,
    /// Confidence in the selection, in [0, 1].
    pub confidence: f64,
}

/// Registry of capability providers with metrics and pluggable selection.
pub struct CapabilityRegistry {
    providers: DashMap<String, Arc<dyn CapabilityProvider>>,
    metrics: DashMap<String, ProviderMetrics>,
    strategy: RwLock<Box<dyn SelectionStrategy>>,
}

impl CapabilityRegistry {
    /// Create an empty registry with the balanced strategy.
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
            metrics: DashMap::new(),
            strategy: RwLock::new(Box::new(Balanced)),
        }
    }

    /// Create an empty registry with an explicit strategy.
    pub fn with_strategy(strategy: Box<dyn SelectionStrategy>) -> Self {
        Self {
            providers: DashMap::new(),
            metrics: DashMap::new(),
            strategy: RwLock::new(strategy),
        }
    }

    /// Replace the active selection strategy.
    pub fn set_strategy(&self, strategy: Box<dyn SelectionStrategy>) {
        let name = strategy.name();
        *self.strategy.write().expect("strategy lock poisoned") = strategy;
        info!(strategy = name, "selection strategy replaced");
    }

    /// Register a provider under its descriptor name, replacing any
    /// previous registration with that name.
    pub fn register(&self, provider: Arc<dyn CapabilityProvider>) {
        let descriptor = provider.descriptor();
        info!(
            provider = %descriptor.name,
            tier = %descriptor.tier,
            kind = %descriptor.kind(),
            "provider registered"
        );
        self.providers.insert(descriptor.name, provider);
    }

    /// Remove a provider from selection. Its metrics are retained.
    pub fn unregister(&self, name: &str) -> Result<(), SwitchyardError> {
        match self.providers.remove(name) {
            Some(_) => {
                info!(provider = name, "provider unregistered");
                Ok(())
            }
            None => Err(SwitchyardError::ProviderNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Providers eligible for the given task type.
    pub fn providers_for_task(&self, task_type: TaskType) -> Vec<Arc<dyn CapabilityProvider>> {
        self.providers
            .iter()
            .filter(|entry| entry.value().can_handle(task_type))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Descriptors of all registered providers, sorted by name.
    pub fn all_providers(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<ProviderDescriptor> = self
            .providers
            .iter()
            .map(|entry| entry.value().descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Metrics snapshot for one provider.
    pub fn metrics(&self, name: &str) -> Option<ProviderMetrics> {
        self.metrics.get(name).map(|m| m.clone())
    }

    /// Fold one completed request into a provider's metrics.
    ///
    /// The fold happens under the map entry lock, so interleaved updates
    /// for the same provider are serialized.
    pub fn update_metrics(
        &self,
        name: &str,
        success: bool,
        latency_ms: u64,
        cost_usd: f64,
        error_code: Option<&str>,
    ) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(success, latency_ms, cost_usd, error_code);
    }

    /// Select the best provider for a request, without the audit record.
    pub fn find_best_provider(
        &self,
        request: &RouteRequest,
        analysis: Option<&QueryAnalysis>,
    ) -> Option<Arc<dyn CapabilityProvider>> {
        self.find_best_with_routing(request, analysis)
            .map(|(provider, _)| provider)
    }

    /// Select the best provider and explain the decision.
    ///
    /// Filters by task eligibility (and forced tier when present),
    /// applies the context-factor overlay, then the configured strategy.
    /// An empty candidate set is `None`, not an error.
    pub fn find_best_with_routing(
        &self,
        request: &RouteRequest,
        analysis: Option<&QueryAnalysis>,
    ) -> Option<(Arc<dyn CapabilityProvider>, RoutingInfo)> {
        let started = Instant::now();

        let mut eligible: Vec<(Arc<dyn CapabilityProvider>, Candidate)> = self
            .providers
            .iter()
            .filter(|entry| entry.value().can_handle(request.task_type))
            .map(|entry| {
                let provider = Arc::clone(entry.value());
                let descriptor = provider.descriptor();
                let metrics = self
                    .metrics
                    .get(&descriptor.name)
                    .map(|m| m.clone())
                    .unwrap_or_default();
                (
                    provider,
                    Candidate {
                        descriptor,
                        metrics,
                    },
                )
            })
            .collect();

        if let Some(tier) = request.forced_tier {
            eligible.retain(|(_, c)| c.descriptor.tier == tier);
        }
        // Deterministic ordering regardless of map iteration order.
        eligible.sort_by(|a, b| a.1.descriptor.name.cmp(&b.1.descriptor.name));

        if eligible.is_empty() {
            debug!(task = %request.task_type, "no eligible providers");
            return None;
        }

        let candidates: Vec<Candidate> = eligible.iter().map(|(_, c)| c.clone()).collect();

        let (index, reason, confidence) = if request.forced_tier.is_some() {
            // A forced tier bypasses both the overlay and the strategy.
            (
                0,
                format!("forced tier {}", eligible[0].1.descriptor.tier),
                1.0,
            )
        } else if let Some((index, reason, confidence)) = analysis
            .and_then(|a| a.context_factors.as_ref())
            .and_then(|f| self.suggest_for_context(f, &candidates, request))
        {
            (index, reason, confidence)
        } else {
            let strategy = self.strategy.read().expect("strategy lock poisoned");
            let index = strategy.select(&candidates, request)?;
            let confidence = analysis.map_or(1.0, |a| a.confidence);
            (index, format!("strategy {}", strategy.name()), confidence)
        };

        let chosen = &candidates[index];
        let alternatives = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.descriptor.name.clone())
            .collect();

        let info = RoutingInfo {
            provider: chosen.descriptor.name.clone(),
            reason,
            alternatives,
            selection_latency_ms: started.elapsed().as_secs_f64() * 1000.0,
            estimated_cost_usd: (chosen.metrics.total_requests > 0)
                .then(|| chosen.metrics.avg_cost_usd()),
            confidence: info_confidence(chosen, confidence),
        };

        info!(
            provider = %info.provider,
            reason = %info.reason,
            confidence = info.confidence,
            "provider selected"
        );

        Some((Arc::clone(&eligible[index].0), info))
    }

    /// Context-factor overlay on top of the configured strategy.
    ///
    /// Strong escalation prefers tier >= 2 providers; a topic shift
    /// prefers "general"-capability providers at tier >= 1. Each override
    /// reports its reasoning and a confidence so the decision is
    /// auditable. Returns `None` to defer to the strategy.
    pub fn suggest_for_context(
        &self,
        factors: &ContextFactors,
        candidates: &[Candidate],
        request: &RouteRequest,
    ) -> Option<(usize, String, f64)> {
        if factors.complexity_escalation > ESCALATION_OVERRIDE_THRESHOLD {
            let subset: Vec<usize> = (0..candidates.len())
                .filter(|&i| candidates[i].descriptor.tier.as_u8() >= 2)
                .collect();
            if let Some(index) = self.select_within(&subset, candidates, request) {
                let confidence = (factors.complexity_escalation / 3.0).min(1.0);
                return Some((
                    index,
                    format!(
                        "escalation {:.1} detected, preferring tier >= 2",
                        factors.complexity_escalation
                    ),
                    confidence,
                ));
            }
        }

        if factors.topic_shift {
            let subset: Vec<usize> = (0..candidates.len())
                .filter(|&i| {
                    let d = &candidates[i].descriptor;
                    d.tier.as_u8() >= 1 && d.capabilities.iter().any(|c| c == "general")
                })
                .collect();
            if let Some(index) = self.select_within(&subset, candidates, request) {
                return Some((
                    index,
                    "topic shift detected, preferring general capability at tier >= 1"
                        .to_string(),
                    0.7,
                ));
            }
        }

        None
    }

    /// Run the configured strategy against a subset of candidates,
    /// mapping the winner back to the full candidate index.
    fn select_within(
        &self,
        subset: &[usize],
        candidates: &[Candidate],
        request: &RouteRequest,
    ) -> Option<usize> {
        if subset.is_empty() {
            return None;
        }
        let narrowed: Vec<Candidate> =
            subset.iter().map(|&i| candidates[i].clone()).collect();
        let strategy = self.strategy.read().expect("strategy lock poisoned");
        strategy
            .select(&narrowed, request)
            .map(|local| subset[local])
    }

    /// Probe every provider's health concurrently with a per-probe
    /// timeout. A probe failure or timeout marks only that provider
    /// unhealthy.
    pub async fn check_all_health(&self, timeout: Duration) -> HashMap<String, bool> {
        let snapshot: Vec<(String, Arc<dyn CapabilityProvider>)> = self
            .providers
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let probes = snapshot.into_iter().map(|(name, provider)| async move {
            let healthy = match tokio::time::timeout(timeout, provider.health_check()).await {
                Ok(Ok(status)) => !matches!(
                    status,
                    switchyard_core::types::HealthStatus::Unhealthy(_)
                ),
                Ok(Err(err)) => {
                    warn!(provider = %name, error = %err, "health probe failed");
                    false
                }
                Err(_) => {
                    warn!(provider = %name, timeout_ms = timeout.as_millis() as u64, "health probe timed out");
                    false
                }
            };
            (name, healthy)
        });

        join_all(probes).await.into_iter().collect()
    }

    /// Provider-reported usage statistics, keyed by name. Providers
    /// whose stats call fails are omitted.
    pub async fn all_stats(&self) -> HashMap<String, serde_json::Value> {
        let snapshot: Vec<(String, Arc<dyn CapabilityProvider>)> = self
            .providers
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let calls = snapshot.into_iter().map(|(name, provider)| async move {
            match provider.usage_stats().await {
                Ok(stats) => Some((name, stats)),
                Err(err) => {
                    warn!(provider = %name, error = %err, "usage stats unavailable");
                    None
                }
            }
        });

        join_all(calls).await.into_iter().flatten().collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend the overlay/strategy confidence with the chosen provider's
/// observed reliability.
fn info_confidence(chosen: &Candidate, base: f64) -> f64 {
    let reliability = 1.0 - chosen.metrics.error_rate();
    (base * reliability).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use switchyard_core::types::{
        ExecutionFailure, ExecutionOutcome, HealthStatus, ProviderCall, ProviderDetail,
        TokenUsage, Tier,
    };

    struct StubProvider {
        name: String,
        tier: Tier,
        capabilities: Vec<String>,
        tasks: Vec<TaskType>,
        healthy: bool,
        slow_probe: bool,
    }

    impl StubProvider {
        fn new(name: &str, tier: Tier) -> Self {
            Self {
                name: name.to_string(),
                tier,
                capabilities: vec!["general".to_string()],
                tasks: vec![TaskType::General],
                healthy: true,
                slow_probe: false,
            }
        }

        fn with_tasks(mut self, tasks: Vec<TaskType>) -> Self {
            self.tasks = tasks;
            self
        }

        fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
            self.capabilities = capabilities;
            self
        }

        fn unhealthy(mut self) -> Self {
            self.healthy = false;
            self
        }

        fn slow(mut self) -> Self {
            self.slow_probe = true;
            self
        }
    }

    #[async_trait]
    impl CapabilityProvider for StubProvider {
        fn descriptor(&self) -> ProviderDescriptor {
            ProviderDescriptor {
                name: self.name.clone(),
                version: semver::Version::new(1, 0, 0),
                tier: self.tier,
                supported_tasks: self.tasks.clone(),
                capabilities: self.capabilities.clone(),
                detail: ProviderDetail::Llm {
                    vendor: "stub".to_string(),
                    model_id: self.name.clone(),
                },
            }
        }

        async fn execute(
            &self,
            call: ProviderCall,
        ) -> Result<ExecutionOutcome, ExecutionFailure> {
            Ok(ExecutionOutcome {
                text: call.prompt,
                usage: TokenUsage::default(),
                latency_ms: 1,
            })
        }

        async fn health_check(&self) -> Result<HealthStatus, SwitchyardError> {
            if self.slow_probe {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            if self.healthy {
                Ok(HealthStatus::Healthy)
            } else {
                Ok(HealthStatus::Unhealthy("stub down".to_string()))
            }
        }

        async fn usage_stats(&self) -> Result<serde_json::Value, SwitchyardError> {
            if self.healthy {
                Ok(serde_json::json!({ "provider": self.name }))
            } else {
                Err(SwitchyardError::Internal("stats unavailable".to_string()))
            }
        }
    }

    fn factors(escalation: f64, topic_shift: bool) -> ContextFactors {
        ContextFactors {
            continuity_bonus: 0.0,
            complexity_escalation: escalation,
            topic_shift,
            performance_adjustment: 0.0,
            turn_count: 3,
            complexity_hint: None,
        }
    }

    fn analysis_with(factors: ContextFactors) -> QueryAnalysis {
        QueryAnalysis {
            complexity: 5.0,
            reasoning_depth: 3.0,
            confidence: 0.8,
            query: "test".to_string(),
            context_factors: Some(factors),
        }
    }

    #[test]
    fn register_then_unregister_removes_from_selection() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("alpha", Tier::Standard)));
        registry.register(Arc::new(StubProvider::new("beta", Tier::Standard)));
        assert_eq!(registry.all_providers().len(), 2);

        registry.unregister("alpha").unwrap();
        let names: Vec<String> = registry
            .all_providers()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["beta".to_string()]);

        let request = RouteRequest::new("hello world there");
        let (provider, _) = registry.find_best_with_routing(&request, None).unwrap();
        assert_eq!(provider.descriptor().name, "beta");
    }

    #[test]
    fn unregister_unknown_is_provider_not_found() {
        let registry = CapabilityRegistry::new();
        let err = registry.unregister("ghost").unwrap_err();
        assert!(matches!(
            err,
            SwitchyardError::ProviderNotFound { name } if name == "ghost"
        ));
    }

    #[test]
    fn empty_registry_selects_none() {
        let registry = CapabilityRegistry::new();
        let request = RouteRequest::new("anything at all here");
        assert!(registry.find_best_with_routing(&request, None).is_none());
    }

    #[test]
    fn task_filter_excludes_incompatible_providers() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(
            StubProvider::new("coder", Tier::Advanced)
                .with_tasks(vec![TaskType::CodeGeneration])
                .with_capabilities(vec!["code".to_string()]),
        ));
        registry.register(Arc::new(StubProvider::new("chat", Tier::Standard)));

        let request = RouteRequest::new("write a parser").with_task_type(TaskType::CodeGeneration);
        let (provider, info) = registry.find_best_with_routing(&request, None).unwrap();
        assert_eq!(provider.descriptor().name, "coder");
        assert!(info.alternatives.is_empty());
    }

    #[test]
    fn forced_tier_bypasses_strategy() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("cheap", Tier::Economy)));
        registry.register(Arc::new(StubProvider::new("big", Tier::Frontier)));
        // Make "cheap" the obvious strategy pick.
        registry.update_metrics("big", true, 900, 5.0, None);

        let request = RouteRequest::new("hello").with_forced_tier(Tier::Frontier);
        let (provider, info) = registry.find_best_with_routing(&request, None).unwrap();
        assert_eq!(provider.descriptor().name, "big");
        assert!(info.reason.contains("forced tier"));
    }

    #[test]
    fn forced_tier_with_no_match_is_none() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("cheap", Tier::Economy)));
        let request = RouteRequest::new("hello").with_forced_tier(Tier::Frontier);
        assert!(registry.find_best_with_routing(&request, None).is_none());
    }

    #[test]
    fn escalation_overlay_prefers_high_tier() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("economy", Tier::Economy)));
        registry.register(Arc::new(StubProvider::new("advanced", Tier::Advanced)));

        let analysis = analysis_with(factors(2.0, false));
        let request = RouteRequest::new("please elaborate in depth");
        let (provider, info) = registry
            .find_best_with_routing(&request, Some(&analysis))
            .unwrap();
        assert_eq!(provider.descriptor().name, "advanced");
        assert!(info.reason.contains("escalation"));
        assert!(info.confidence > 0.0 && info.confidence <= 1.0);
    }

    #[test]
    fn escalation_overlay_falls_back_when_no_high_tier() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("economy", Tier::Economy)));

        let analysis = analysis_with(factors(2.5, false));
        let request = RouteRequest::new("please elaborate in depth");
        let (provider, info) = registry
            .find_best_with_routing(&request, Some(&analysis))
            .unwrap();
        assert_eq!(provider.descriptor().name, "economy");
        assert!(info.reason.contains("strategy"));
    }

    #[test]
    fn topic_shift_overlay_prefers_general_capability() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(
            StubProvider::new("specialist", Tier::Advanced)
                .with_capabilities(vec!["code".to_string()])
                .with_tasks(vec![TaskType::General]),
        ));
        registry.register(Arc::new(StubProvider::new("generalist", Tier::Standard)));

        let analysis = analysis_with(factors(0.0, true));
        let request = RouteRequest::new("completely new subject now");
        let (provider, info) = registry
            .find_best_with_routing(&request, Some(&analysis))
            .unwrap();
        assert_eq!(provider.descriptor().name, "generalist");
        assert!(info.reason.contains("topic shift"));
    }

    #[test]
    fn metrics_accumulate_through_registry() {
        let registry = CapabilityRegistry::new();
        for _ in 0..5 {
            registry.update_metrics("alpha", true, 100, 0.01, None);
        }
        registry.update_metrics("alpha", false, 100, 0.0, Some("timeout"));

        let m = registry.metrics("alpha").unwrap();
        assert_eq!(m.total_requests, 6);
        assert!((m.total_cost_usd - 0.05).abs() < 1e-9);
        assert!((m.error_rate() - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(m.last_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn routing_info_reports_observed_cost_and_alternatives() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("alpha", Tier::Standard)));
        registry.register(Arc::new(StubProvider::new("beta", Tier::Standard)));
        registry.update_metrics("alpha", true, 50, 0.02, None);
        registry.update_metrics("alpha", true, 50, 0.04, None);

        let request = RouteRequest::new("hello there friend");
        let (_, info) = registry.find_best_with_routing(&request, None).unwrap();
        assert_eq!(info.alternatives.len(), 1);
        if info.provider == "alpha" {
            let cost = info.estimated_cost_usd.unwrap();
            assert!((cost - 0.03).abs() < 1e-9);
        } else {
            assert!(info.estimated_cost_usd.is_none());
        }
    }

    #[tokio::test]
    async fn health_sweep_isolates_failures_and_timeouts() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("good", Tier::Standard)));
        registry.register(Arc::new(StubProvider::new("bad", Tier::Standard).unhealthy()));
        registry.register(Arc::new(StubProvider::new("stuck", Tier::Standard).slow()));

        let report = registry.check_all_health(Duration::from_millis(50)).await;
        assert_eq!(report.get("good"), Some(&true));
        assert_eq!(report.get("bad"), Some(&false));
        assert_eq!(report.get("stuck"), Some(&false));
    }

    #[tokio::test]
    async fn all_stats_omits_failing_providers() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(StubProvider::new("good", Tier::Standard)));
        registry.register(Arc::new(StubProvider::new("bad", Tier::Standard).unhealthy()));

        let stats = registry.all_stats().await;
        assert!(stats.contains_key("good"));
        assert!(!stats.contains_key("bad"));
    }
}
