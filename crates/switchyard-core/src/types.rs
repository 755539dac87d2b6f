// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the routing pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ordinal capability/cost tier of a provider. Higher = more capable and
/// more expensive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Tier 0: cheapest backends for trivial requests.
    Economy,
    /// Tier 1: general-purpose default.
    Standard,
    /// Tier 2: strong reasoning backends.
    Advanced,
    /// Tier 3: frontier backends for the hardest requests.
    Frontier,
}

impl Tier {
    /// The ordinal value (0-3) of this tier.
    pub fn as_u8(self) -> u8 {
        match self {
            Tier::Economy => 0,
            Tier::Standard => 1,
            Tier::Advanced => 2,
            Tier::Frontier => 3,
        }
    }

    /// Parse an ordinal value into a tier. Values outside 0-3 are `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Tier::Economy),
            1 => Some(Tier::Standard),
            2 => Some(Tier::Advanced),
            3 => Some(Tier::Frontier),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Economy => write!(f, "economy"),
            Tier::Standard => write!(f, "standard"),
            Tier::Advanced => write!(f, "advanced"),
            Tier::Frontier => write!(f, "frontier"),
        }
    }
}

/// Declared task type of a request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Caller did not declare a type; routing infers from analysis.
    #[default]
    Auto,
    General,
    CodeGeneration,
    CodeExecution,
    Analysis,
    Translation,
    Summarization,
    VectorSearch,
    FileTransfer,
}

/// Token counts for one request, split by billing category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cached_tokens: u32,
    pub reasoning_tokens: u32,
}

impl TokenUsage {
    /// Total tokens across all categories.
    pub fn total(&self) -> u64 {
        u64::from(self.input_tokens)
            + u64::from(self.output_tokens)
            + u64::from(self.cached_tokens)
            + u64::from(self.reasoning_tokens)
    }
}

/// One prior exchange in a conversation, as seen by the context analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Exchange {
    /// Full response text of the exchange.
    pub response_text: String,
    /// Error recorded for the exchange, if any.
    pub error: Option<String>,
    /// Tier that served the exchange, if known.
    pub tier: Option<Tier>,
}

/// Conversation history supplied by the caller. The analyzer only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Prior exchanges, oldest first.
    pub exchanges: Vec<Exchange>,
    /// Number of turns so far.
    pub turn_count: u32,
    /// Free-text summary of the conversation, if one is maintained.
    pub summary: Option<String>,
    /// Caller's own estimate of the current complexity level.
    pub complexity_hint: Option<f64>,
}

/// A routing request. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub prompt: String,
    pub task_type: TaskType,
    /// Forces selection to this tier, bypassing strategy ranking (but never
    /// the budget gate).
    pub forced_tier: Option<Tier>,
    pub metadata: Option<HashMap<String, String>>,
    pub conversation: Option<ConversationContext>,
}

impl RouteRequest {
    /// Create a request for the given prompt with task type `Auto`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            task_type: TaskType::Auto,
            forced_tier: None,
            metadata: None,
            conversation: None,
        }
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_forced_tier(mut self, tier: Tier) -> Self {
        self.forced_tier = Some(tier);
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationContext) -> Self {
        self.conversation = Some(conversation);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Health status reported by provider health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Provider is fully operational.
    Healthy,
    /// Provider is operational but experiencing issues.
    Degraded(String),
    /// Provider is not operational.
    Unhealthy(String),
}

/// Discriminator for the heterogeneous provider kinds the registry holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Llm,
    VectorStore,
    FileStore,
    CodeExecution,
}

/// Kind-specific attributes, tagged by [`ProviderKind`]. Call sites dispatch
/// on the discriminator instead of downcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderDetail {
    Llm {
        vendor: String,
        model_id: String,
    },
    VectorStore {
        index: String,
        dimension: u32,
    },
    FileStore {
        root: String,
    },
    CodeExecution {
        runtime: String,
    },
}

impl ProviderDetail {
    /// The discriminator for this payload.
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderDetail::Llm { .. } => ProviderKind::Llm,
            ProviderDetail::VectorStore { .. } => ProviderKind::VectorStore,
            ProviderDetail::FileStore { .. } => ProviderKind::FileStore,
            ProviderDetail::CodeExecution { .. } => ProviderKind::CodeExecution,
        }
    }
}

/// Static identity and capability declaration of a registered provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique registry key.
    pub name: String,
    pub version: semver::Version,
    pub tier: Tier,
    /// Task types this provider declares support for.
    pub supported_tasks: Vec<TaskType>,
    /// Free-form capability tags; "general" marks a provider eligible for
    /// `TaskType::Auto` requests.
    pub capabilities: Vec<String>,
    /// Kind-specific payload.
    pub detail: ProviderDetail,
}

impl ProviderDescriptor {
    /// The provider kind, read off the detail payload.
    pub fn kind(&self) -> ProviderKind {
        self.detail.kind()
    }
}

/// What the execution client receives for one provider call.
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub prompt: String,
    pub task_type: TaskType,
    pub max_tokens: u32,
}

/// Successful result of one provider execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub text: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
}

/// A provider-level execution failure. Carries any token usage that was
/// consumed before the failure (or cancellation) so it can still be billed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("execution failed: {message}")]
pub struct ExecutionFailure {
    pub message: String,
    pub error_code: Option<String>,
    pub partial_usage: Option<TokenUsage>,
}
