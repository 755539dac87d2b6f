// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-provider pricing tables and cost estimation.
//!
//! Prices are USD per thousand tokens, registered per provider id. A
//! provider with no registered pricing is an error at estimate time;
//! cost tracking never silently assumes zero.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use switchyard_core::types::TokenUsage;
use switchyard_core::SwitchyardError;

/// Per-provider pricing in USD per thousand tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Cost per thousand input tokens.
    pub input_per_1k: f64,
    /// Cost per thousand output tokens.
    pub output_per_1k: f64,
    /// Cost per thousand cached tokens.
    pub cached_per_1k: f64,
    /// Cost per thousand reasoning tokens.
    pub reasoning_per_1k: f64,
    /// Floor applied to any non-free request.
    pub minimum_charge: Option<f64>,
    /// Requests whose total tokens fit this allowance cost nothing.
    pub free_tier_tokens: Option<u64>,
}

/// Itemized cost of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cached_cost: f64,
    pub reasoning_cost: f64,
    /// Sum of the components, after free-tier and minimum-charge rules.
    pub total_usd: f64,
}

/// Registry of pricing tables keyed by provider id.
#[derive(Debug, Default)]
pub struct PricingBook {
    prices: RwLock<HashMap<String, ModelPricing>>,
}

impl PricingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) pricing for a provider.
    pub fn register(&self, provider: &str, pricing: ModelPricing) {
        self.prices
            .write()
            .expect("pricing lock poisoned")
            .insert(provider.to_string(), pricing);
    }

    /// Whether pricing is registered for a provider.
    pub fn has_pricing(&self, provider: &str) -> bool {
        self.prices
            .read()
            .expect("pricing lock poisoned")
            .contains_key(provider)
    }

    /// Estimate the cost of a request against a provider's price table.
    ///
    /// Rules, in order: a request fully covered by the free-tier
    /// allowance costs zero; otherwise per-1k rates apply, and the total
    /// is floored at the minimum charge when one is set. Costs are never
    /// negative.
    pub fn estimate(
        &self,
        provider: &str,
        usage: &TokenUsage,
    ) -> Result<CostBreakdown, SwitchyardError> {
        let prices = self.prices.read().expect("pricing lock poisoned");
        let pricing =
            prices
                .get(provider)
                .ok_or_else(|| SwitchyardError::PricingNotFound {
                    provider: provider.to_string(),
                })?;

        if let Some(free) = pricing.free_tier_tokens
            && usage.total() <= free
        {
            return Ok(CostBreakdown::default());
        }

        let per_1k = |tokens: u32, rate: f64| f64::from(tokens) / 1000.0 * rate;
        let input_cost = per_1k(usage.input_tokens, pricing.input_per_1k);
        let output_cost = per_1k(usage.output_tokens, pricing.output_per_1k);
        let cached_cost = per_1k(usage.cached_tokens, pricing.cached_per_1k);
        let reasoning_cost = per_1k(usage.reasoning_tokens, pricing.reasoning_per_1k);

        let mut total_usd = input_cost + output_cost + cached_cost + reasoning_cost;
        if let Some(minimum) = pricing.minimum_charge {
            total_usd = total_usd.max(minimum);
        }

        Ok(CostBreakdown {
            input_cost,
            output_cost,
            cached_cost,
            reasoning_cost,
            total_usd,
        })
    }
}
