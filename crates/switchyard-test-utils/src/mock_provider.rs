// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock capability provider for deterministic testing.
//!
//! `MockCapabilityProvider` implements `CapabilityProvider` with scripted
//! outcomes, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use switchyard_core::types::{
    ExecutionFailure, ExecutionOutcome, HealthStatus, ProviderCall, ProviderDescriptor,
    ProviderDetail, TaskType, Tier, TokenUsage,
};
use switchyard_core::{CapabilityProvider, SwitchyardError};

/// One scripted outcome for a mock execution.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Success {
        text: String,
        usage: TokenUsage,
        latency_ms: u64,
    },
    Failure {
        message: String,
        error_code: Option<String>,
        partial_usage: Option<TokenUsage>,
    },
}

impl ScriptedResponse {
    /// A success with the given text and a standard 10/20 token usage.
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedResponse::Success {
            text: text.into(),
            usage: default_usage(),
            latency_ms: 5,
        }
    }

    /// A failure with the given message and no partial usage.
    pub fn error(message: impl Into<String>) -> Self {
        ScriptedResponse::Failure {
            message: message.into(),
            error_code: None,
            partial_usage: None,
        }
    }
}

fn default_usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
        ..Default::default()
    }
}

/// A mock provider that pops scripted outcomes from a FIFO queue.
///
/// When the queue is empty, a default "mock response" success is
/// returned. Every `execute` call is counted, rejections included on the
/// caller side can be asserted against [`call_count`].
///
/// [`call_count`]: MockCapabilityProvider::call_count
pub struct MockCapabilityProvider {
    name: String,
    tier: Tier,
    supported_tasks: Vec<TaskType>,
    capabilities: Vec<String>,
    health: Mutex<HealthStatus>,
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    calls: AtomicUsize,
}

impl MockCapabilityProvider {
    /// Create a mock provider with an empty response queue, supporting
    /// `General` tasks with the "general" capability tag.
    pub fn new(name: &str, tier: Tier) -> Self {
        Self {
            name: name.to_string(),
            tier,
            supported_tasks: vec![TaskType::General],
            capabilities: vec!["general".to_string()],
            health: Mutex::new(HealthStatus::Healthy),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskType>) -> Self {
        self.supported_tasks = tasks;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_health(self, health: HealthStatus) -> Self {
        *self.health.lock().expect("health lock poisoned") = health;
        self
    }

    /// Pre-load the response queue.
    pub fn with_responses(self, responses: Vec<ScriptedResponse>) -> Self {
        self.responses
            .lock()
            .expect("response lock poisoned")
            .extend(responses);
        self
    }

    /// Add a response to the end of the queue.
    pub fn push_response(&self, response: ScriptedResponse) {
        self.responses
            .lock()
            .expect("response lock poisoned")
            .push_back(response);
    }

    /// Number of `execute` calls this provider has served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> ScriptedResponse {
        self.responses
            .lock()
            .expect("response lock poisoned")
            .pop_front()
            .unwrap_or_else(|| ScriptedResponse::text("mock response"))
    }
}

#[async_trait]
impl CapabilityProvider for MockCapabilityProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name.clone(),
            version: semver::Version::new(0, 1, 0),
            tier: self.tier,
            supported_tasks: self.supported_tasks.clone(),
            capabilities: self.capabilities.clone(),
            detail: ProviderDetail::Llm {
                vendor: "mock".to_string(),
                model_id: self.name.clone(),
            },
        }
    }

    async fn execute(&self, _call: ProviderCall) -> Result<ExecutionOutcome, ExecutionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_response() {
            ScriptedResponse::Success {
                text,
                usage,
                latency_ms,
            } => Ok(ExecutionOutcome {
                text,
                usage,
                latency_ms,
            }),
            ScriptedResponse::Failure {
                message,
                error_code,
                partial_usage,
            } => Err(ExecutionFailure {
                message,
                error_code,
                partial_usage,
            }),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchyardError> {
        Ok(self.health.lock().expect("health lock poisoned").clone())
    }

    async fn usage_stats(&self) -> Result<serde_json::Value, SwitchyardError> {
        Ok(serde_json::json!({ "calls": self.call_count() }))
    }
}
