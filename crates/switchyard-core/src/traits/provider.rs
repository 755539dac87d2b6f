// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability-provider contract implemented by every backend the
//! registry can route to (LLM, vector store, file store, code execution).

use async_trait::async_trait;

use crate::error::SwitchyardError;
use crate::types::{
    ExecutionFailure, ExecutionOutcome, HealthStatus, ProviderCall, ProviderDescriptor,
    TaskType,
};

/// A registered backend with a uniform execute/health/stats contract.
///
/// Providers are explicitly constructed and dependency-injected; the
/// registry is their sole owner for the process lifetime. Execution is a
/// single async call returning the full outcome -- incremental delivery is
/// a future extension point, not a one-chunk stream.
#[async_trait]
pub trait CapabilityProvider: Send + Sync + 'static {
    /// Identity, tier, and declared capabilities of this provider.
    fn descriptor(&self) -> ProviderDescriptor;

    /// Whether this provider is eligible for a request of the given task
    /// type. `Auto` requests match any provider declaring the "general"
    /// capability.
    fn can_handle(&self, task_type: TaskType) -> bool {
        let descriptor = self.descriptor();
        if task_type == TaskType::Auto {
            return descriptor.capabilities.iter().any(|c| c == "general")
                || descriptor.supported_tasks.contains(&TaskType::General);
        }
        descriptor.supported_tasks.contains(&task_type)
    }

    /// Prepares the provider for use (connections, warm caches).
    async fn initialize(&self) -> Result<(), SwitchyardError> {
        Ok(())
    }

    /// Releases any held resources.
    async fn shutdown(&self) -> Result<(), SwitchyardError> {
        Ok(())
    }

    /// Executes one call. A failure may still carry partial token usage,
    /// which is billed as actual usage.
    async fn execute(&self, call: ProviderCall) -> Result<ExecutionOutcome, ExecutionFailure>;

    /// Probes the provider's health.
    async fn health_check(&self) -> Result<HealthStatus, SwitchyardError>;

    /// Provider-reported usage statistics, aggregated by the registry into
    /// a name-keyed map.
    async fn usage_stats(&self) -> Result<serde_json::Value, SwitchyardError>;
}
