// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable provider selection strategies.
//!
//! A strategy is a pure policy over a snapshot of eligible candidates;
//! it never touches the live registry. Returning `None` means the
//! strategy declines to pick (caller falls back or reports no provider).

use switchyard_core::types::RouteRequest;

use crate::metrics::ProviderMetrics;
use switchyard_core::types::ProviderDescriptor;

/// A snapshot of one eligible provider at selection time.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The provider's descriptor.
    pub descriptor: ProviderDescriptor,
    /// Metrics snapshot taken when the candidate list was built.
    pub metrics: ProviderMetrics,
}

/// A selection policy over a candidate snapshot.
pub trait SelectionStrategy: Send + Sync {
    /// Stable name used in routing reason strings.
    fn name(&self) -> &'static str;

    /// Pick the index of the preferred candidate, or `None` to decline.
    fn select(&self, candidates: &[Candidate], request: &RouteRequest) -> Option<usize>;
}

/// Lowest observed average cost per request; ties break toward the
/// lower tier.
pub struct CostOptimized;

impl SelectionStrategy for CostOptimized {
    fn name(&self) -> &'static str {
        "cost-optimized"
    }

    fn select(&self, candidates: &[Candidate], _request: &RouteRequest) -> Option<usize> {
        (0..candidates.len()).min_by(|&a, &b| {
            let (ca, cb) = (&candidates[a], &candidates[b]);
            ca.metrics
                .avg_cost_usd()
                .total_cmp(&cb.metrics.avg_cost_usd())
                .then(ca.descriptor.tier.cmp(&cb.descriptor.tier))
        })
    }
}

/// Lowest average latency; ties break toward the higher uptime.
pub struct PerformanceFirst;

impl SelectionStrategy for PerformanceFirst {
    fn name(&self) -> &'static str {
        "performance-first"
    }

    fn select(&self, candidates: &[Candidate], _request: &RouteRequest) -> Option<usize> {
        (0..candidates.len()).min_by(|&a, &b| {
            let (ca, cb) = (&candidates[a], &candidates[b]);
            ca.metrics
                .avg_latency_ms
                .total_cmp(&cb.metrics.avg_latency_ms)
                .then(
                    cb.metrics
                        .uptime_percent()
                        .total_cmp(&ca.metrics.uptime_percent()),
                )
        })
    }
}

/// Weighted combination of normalized cost, normalized latency, and
/// error rate. Lower is better.
pub struct Balanced;

const BALANCED_COST_WEIGHT: f64 = 0.4;
const BALANCED_LATENCY_WEIGHT: f64 = 0.4;
const BALANCED_ERROR_WEIGHT: f64 = 0.2;

impl SelectionStrategy for Balanced {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn select(&self, candidates: &[Candidate], _request: &RouteRequest) -> Option<usize> {
        let max_cost = candidates
            .iter()
            .map(|c| c.metrics.avg_cost_usd())
            .fold(0.0_f64, f64::max);
        let max_latency = candidates
            .iter()
            .map(|c| c.metrics.avg_latency_ms)
            .fold(0.0_f64, f64::max);

        let score = |c: &Candidate| {
            let cost = if max_cost > 0.0 {
                c.metrics.avg_cost_usd() / max_cost
            } else {
                0.0
            };
            let latency = if max_latency > 0.0 {
                c.metrics.avg_latency_ms / max_latency
            } else {
                0.0
            };
            BALANCED_COST_WEIGHT * cost
                + BALANCED_LATENCY_WEIGHT * latency
                + BALANCED_ERROR_WEIGHT * c.metrics.error_rate()
        };

        (0..candidates.len())
            .min_by(|&a, &b| score(&candidates[a]).total_cmp(&score(&candidates[b])))
    }
}

/// Lowest error rate; ties break toward the higher uptime.
pub struct ReliabilityFirst;

impl SelectionStrategy for ReliabilityFirst {
    fn name(&self) -> &'static str {
        "reliability-first"
    }

    fn select(&self, candidates: &[Candidate], _request: &RouteRequest) -> Option<usize> {
        (0..candidates.len()).min_by(|&a, &b| {
            let (ca, cb) = (&candidates[a], &candidates[b]);
            ca.metrics
                .error_rate()
                .total_cmp(&cb.metrics.error_rate())
                .then(
                    cb.metrics
                        .uptime_percent()
                        .total_cmp(&ca.metrics.uptime_percent()),
                )
        })
    }
}

/// Look up a strategy preset by its configured name.
pub fn preset(name: &str) -> Option<Box<dyn SelectionStrategy>> {
    match name {
        "cost-optimized" => Some(Box::new(CostOptimized)),
        "performance-first" => Some(Box::new(PerformanceFirst)),
        "balanced" => Some(Box::new(Balanced)),
        "reliability-first" => Some(Box::new(ReliabilityFirst)),
        _ => None,
    }
}
