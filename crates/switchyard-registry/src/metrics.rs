// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-provider operational metrics.
//!
//! Metrics are folded in atomically per provider under the registry's
//! map entry lock, so concurrent updates for the same provider never
//! interleave.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Rolling operational metrics for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMetrics {
    /// Total requests routed to this provider.
    pub total_requests: u64,
    /// Requests that completed successfully.
    pub successful_requests: u64,
    /// Requests that failed.
    pub failed_requests: u64,
    /// Running average latency over all requests, in milliseconds.
    pub avg_latency_ms: f64,
    /// Accumulated cost across all requests, in USD.
    pub total_cost_usd: f64,
    /// Error code of the most recent failure, if any.
    pub last_error: Option<String>,
    /// When this provider last served a request.
    pub last_used: Option<DateTime<Utc>>,
    /// Timestamps of requests within the rolling 24h window.
    pub recent_requests: Vec<DateTime<Utc>>,
}

impl ProviderMetrics {
    /// Fold one completed request into the metrics.
    pub fn record(
        &mut self,
        success: bool,
        latency_ms: u64,
        cost_usd: f64,
        error_code: Option<&str>,
    ) {
        let now = Utc::now();
        self.record_at(now, success, latency_ms, cost_usd, error_code);
    }

    /// Fold one completed request with an explicit timestamp.
    ///
    /// Split out so the 24h window pruning is testable without waiting.
    pub fn record_at(
        &mut self,
        now: DateTime<Utc>,
        success: bool,
        latency_ms: u64,
        cost_usd: f64,
        error_code: Option<&str>,
    ) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
            self.last_error = error_code.map(str::to_string);
        }

        // Running mean keeps the fold O(1) per request.
        let delta = latency_ms as f64 - self.avg_latency_ms;
        self.avg_latency_ms += delta / self.total_requests as f64;

        self.total_cost_usd += cost_usd;
        self.last_used = Some(now);

        let cutoff = now - Duration::hours(24);
        self.recent_requests.retain(|t| *t > cutoff);
        self.recent_requests.push(now);
    }

    /// Fraction of requests that failed, in [0, 1]. Zero when idle.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }

    /// Success percentage in [0, 100]. An idle provider reports 100.
    pub fn uptime_percent(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64 * 100.0
        }
    }

    /// Average observed cost per request, in USD. Zero when idle.
    pub fn avg_cost_usd(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_cost_usd / self.total_requests as f64
        }
    }

    /// Number of requests within the rolling 24h window.
    pub fn requests_last_24h(&self) -> usize {
        self.recent_requests.len()
    }
}
