// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchyard routing pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.
//!
//! The analyzer keyword lists and thresholds live here deliberately: they
//! are versioned heuristic data, the main lever for tuning escalation and
//! topic-shift detection, and must be swappable without touching routing
//! logic. The numeric defaults are hand-tuned and pending recalibration
//! against real traffic.

use serde::{Deserialize, Serialize};

/// Top-level Switchyard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Process-level settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Query/context analyzer heuristics.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Provider selection settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Spend ceilings and alert thresholds.
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Process-level runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum requests in flight during batch processing.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-provider health probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_concurrency: default_max_concurrency(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

/// Analyzer heuristic configuration: keyword lists and thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Terms signalling the caller wants a deeper answer than the last one.
    /// Bilingual by default (English + Japanese).
    #[serde(default = "default_escalation_terms")]
    pub escalation_terms: Vec<String>,

    /// Common words excluded from topic-shift keyword extraction.
    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,

    /// Vocabulary indicating multi-step reasoning.
    #[serde(default = "default_reasoning_terms")]
    pub reasoning_terms: Vec<String>,

    /// Domain-specific vocabulary that raises complexity.
    #[serde(default = "default_domain_terms")]
    pub domain_terms: Vec<String>,

    /// Interrogative words, used by escalation and depth scoring.
    #[serde(default = "default_interrogatives")]
    pub interrogatives: Vec<String>,

    /// A preceding response shorter than this is treated as possibly
    /// insufficient.
    #[serde(default = "default_short_response_chars")]
    pub short_response_chars: usize,

    /// A follow-up query longer than this after a short response signals
    /// escalation.
    #[serde(default = "default_long_query_chars")]
    pub long_query_chars: usize,

    /// Responses shorter than this count against the serving model's
    /// performance.
    #[serde(default = "default_brief_response_chars")]
    pub brief_response_chars: usize,

    /// Keyword-overlap ratio below which a topic shift is flagged.
    #[serde(default = "default_topic_shift_overlap")]
    pub topic_shift_overlap: f64,

    /// Hard cap on the escalation adjustment.
    #[serde(default = "default_escalation_cap")]
    pub escalation_cap: f64,

    /// Hard cap on the continuity bonus (before the summary bonus).
    #[serde(default = "default_continuity_cap")]
    pub continuity_cap: f64,

    /// Hard cap on the model-performance confidence adjustment.
    #[serde(default = "default_performance_cap")]
    pub performance_cap: f64,

    /// Maximum keywords extracted per text for topic-shift comparison.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            escalation_terms: default_escalation_terms(),
            stop_words: default_stop_words(),
            reasoning_terms: default_reasoning_terms(),
            domain_terms: default_domain_terms(),
            interrogatives: default_interrogatives(),
            short_response_chars: default_short_response_chars(),
            long_query_chars: default_long_query_chars(),
            brief_response_chars: default_brief_response_chars(),
            topic_shift_overlap: default_topic_shift_overlap(),
            escalation_cap: default_escalation_cap(),
            continuity_cap: default_continuity_cap(),
            performance_cap: default_performance_cap(),
            max_keywords: default_max_keywords(),
        }
    }
}

fn default_escalation_terms() -> Vec<String> {
    [
        "explain",
        "elaborate",
        "detail",
        "more specifically",
        "go deeper",
        "expand on",
        "詳しく",
        "もっと",
        "具体的に",
        "深く",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_stop_words() -> Vec<String> {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her",
        "was", "one", "our", "out", "has", "have", "this", "that", "with", "from",
        "they", "what", "which", "their", "will", "would", "there", "about",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_reasoning_terms() -> Vec<String> {
    [
        "analyze",
        "compare",
        "evaluate",
        "step by step",
        "trade-off",
        "tradeoff",
        "pros and cons",
        "prove",
        "derive",
        "why does",
        "reason about",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_domain_terms() -> Vec<String> {
    [
        "algorithm",
        "architecture",
        "concurrency",
        "database",
        "refactor",
        "optimize",
        "regression",
        "distributed",
        "encryption",
        "compiler",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_interrogatives() -> Vec<String> {
    ["what", "why", "how", "when", "where", "which", "who"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_short_response_chars() -> usize {
    200
}

fn default_long_query_chars() -> usize {
    100
}

fn default_brief_response_chars() -> usize {
    150
}

fn default_topic_shift_overlap() -> f64 {
    0.3
}

fn default_escalation_cap() -> f64 {
    3.0
}

fn default_continuity_cap() -> f64 {
    1.5
}

fn default_performance_cap() -> f64 {
    0.3
}

fn default_max_keywords() -> usize {
    10
}

/// Named selection strategy presets.
pub const STRATEGY_PRESETS: &[&str] = &[
    "cost-optimized",
    "performance-first",
    "balanced",
    "reliability-first",
];

/// Provider selection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Selection strategy preset. One of [`STRATEGY_PRESETS`].
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Characters per token for pre-check input estimates.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: u32,

    /// Assumed output tokens for pre-check estimates.
    #[serde(default = "default_estimated_output_tokens")]
    pub estimated_output_tokens: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chars_per_token: default_chars_per_token(),
            estimated_output_tokens: default_estimated_output_tokens(),
        }
    }
}

fn default_strategy() -> String {
    "balanced".to_string()
}

fn default_chars_per_token() -> u32 {
    4
}

fn default_estimated_output_tokens() -> u32 {
    1024
}

/// Spend ceilings, alert thresholds, and the budget period window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Monthly spending ceiling in USD. `None` means no limit.
    #[serde(default)]
    pub monthly_cap_usd: Option<f64>,

    /// Daily spending ceiling in USD. `None` means no limit.
    #[serde(default)]
    pub daily_cap_usd: Option<f64>,

    /// Hourly spending ceiling in USD. `None` means no limit.
    #[serde(default)]
    pub hourly_cap_usd: Option<f64>,

    /// Fraction of a ceiling at which a warning alert fires.
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,

    /// Fraction of a ceiling at which a critical alert fires.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,

    /// Reject requests outright once a ceiling is reached.
    #[serde(default = "default_auto_pause")]
    pub auto_pause_at_limit: bool,

    /// Hard cap on a single request's estimated cost.
    #[serde(default)]
    pub per_request_cap_usd: Option<f64>,

    /// Hard cap on a session's accumulated cost.
    #[serde(default)]
    pub per_session_cap_usd: Option<f64>,

    /// Notification targets for alerts (delivery is the embedder's concern).
    #[serde(default)]
    pub notify: Vec<String>,

    /// Day of month (1-28) on which the monthly window resets.
    #[serde(default = "default_reset_day")]
    pub reset_day: u32,

    /// Fixed UTC offset of the budget timezone, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            monthly_cap_usd: None,
            daily_cap_usd: None,
            hourly_cap_usd: None,
            warning_threshold: default_warning_threshold(),
            critical_threshold: default_critical_threshold(),
            auto_pause_at_limit: default_auto_pause(),
            per_request_cap_usd: None,
            per_session_cap_usd: None,
            notify: Vec::new(),
            reset_day: default_reset_day(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_warning_threshold() -> f64 {
    0.8
}

fn default_critical_threshold() -> f64 {
    0.95
}

fn default_auto_pause() -> bool {
    true
}

fn default_reset_day() -> u32 {
    1
}
