// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry for the Switchyard routing pipeline.
//!
//! Tracks registered [`CapabilityProvider`]s with per-provider rolling
//! metrics, selects among them via pluggable strategies, and overlays
//! conversation-context signals (escalation, topic shift) on top of the
//! configured strategy.
//!
//! [`CapabilityProvider`]: switchyard_core::CapabilityProvider

pub mod metrics;
pub mod registry;
pub mod strategy;

pub use metrics::ProviderMetrics;
pub use registry::{CapabilityRegistry, RoutingInfo};
pub use strategy::{
    Balanced, Candidate, CostOptimized, PerformanceFirst, ReliabilityFirst, SelectionStrategy,
};
