// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic query complexity scoring.
//!
//! Scores a single prompt for complexity and reasoning depth using
//! zero-cost lexical rules. No model pre-call, no network, no latency.

use serde::{Deserialize, Serialize};
use switchyard_config::AnalyzerConfig;

/// Result of analyzing a query, optionally adjusted by conversation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Estimated complexity in [0, 10].
    pub complexity: f64,
    /// Estimated reasoning depth in [0, 10].
    pub reasoning_depth: f64,
    /// Confidence in the analysis, in [0.1, 1.0].
    pub confidence: f64,
    /// The original query text.
    pub query: String,
    /// Raw context adjustments, present only when conversation context
    /// was applied.
    pub context_factors: Option<ContextFactors>,
}

/// The raw adjustment values computed from conversation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextFactors {
    /// Complexity added for an established conversation.
    pub continuity_bonus: f64,
    /// Complexity added for escalation signals.
    pub complexity_escalation: f64,
    /// Whether the query departs from the previous response's topic.
    pub topic_shift: bool,
    /// Confidence multiplier adjustment from prior model performance.
    pub performance_adjustment: f64,
    /// Turn count of the conversation.
    pub turn_count: u32,
    /// Complexity level the conversation context declared, if any.
    pub complexity_hint: Option<f64>,
}

/// Heuristic query analyzer with zero cost and zero latency.
///
/// Keyword lists and thresholds come from [`AnalyzerConfig`]; they are
/// tuning data, not code.
pub struct QueryAnalyzer {
    config: AnalyzerConfig,
}

impl QueryAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze a single query with no conversation context.
    ///
    /// Pure and deterministic. Empty or whitespace-only input yields the
    /// baseline low-complexity analysis (complexity 1, depth 1,
    /// confidence 1.0).
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return QueryAnalysis {
                complexity: 1.0,
                reasoning_depth: 1.0,
                confidence: 1.0,
                query: query.to_string(),
                context_factors: None,
            };
        }

        let lower = trimmed.to_lowercase();
        let word_count = trimmed.split_whitespace().count();
        let has_reasoning = contains_any(&lower, &self.config.reasoning_terms);
        let has_domain = contains_any(&lower, &self.config.domain_terms);
        let has_code_fence = trimmed.contains("```");
        let multi_sentence = count_sentences(trimmed) >= 3;
        let interrogative = self.is_interrogative(&lower);
        let numbered = has_numbered_list(trimmed);

        let mut complexity: f64 = 1.0;
        let mut signals = 0u32;

        // Signal 1: length bands
        if word_count >= 4 {
            complexity += 1.0;
            signals += 1;
        }
        if word_count >= 16 {
            complexity += 2.0;
            signals += 1;
        }
        if word_count >= 50 {
            complexity += 2.0;
            signals += 1;
        }

        // Signal 2: reasoning vocabulary
        if has_reasoning {
            complexity += 2.0;
            signals += 1;
        }

        // Signal 3: domain vocabulary
        if has_domain {
            complexity += 1.0;
            signals += 1;
        }

        // Signal 4: code blocks
        if has_code_fence {
            complexity += 2.0;
            signals += 1;
        }

        // Signal 5: multi-sentence queries
        if multi_sentence {
            complexity += 1.0;
            signals += 1;
        }

        let mut reasoning_depth: f64 = 1.0;
        if interrogative {
            reasoning_depth += 1.0;
            signals += 1;
        }
        if has_reasoning {
            reasoning_depth += 2.0;
        }
        if numbered {
            reasoning_depth += 1.0;
            signals += 1;
        }
        if word_count >= 16 {
            reasoning_depth += 1.0;
        }
        if has_code_fence {
            reasoning_depth += 2.0;
        }

        let confidence = (0.5 + 0.1 * f64::from(signals)).clamp(0.1, 1.0);

        QueryAnalysis {
            complexity: complexity.clamp(0.0, 10.0),
            reasoning_depth: reasoning_depth.clamp(0.0, 10.0),
            confidence,
            query: query.to_string(),
            context_factors: None,
        }
    }

    /// Whether the lowercased query reads as a question: a question mark,
    /// or an interrogative word at any position.
    pub(crate) fn is_interrogative(&self, lower: &str) -> bool {
        if lower.contains('?') {
            return true;
        }
        lower.split_whitespace().any(|token| {
            let word: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect();
            self.config.interrogatives.iter().any(|w| w == &word)
        })
    }
}

fn contains_any(lower: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| lower.contains(t.to_lowercase().as_str()))
}

fn count_sentences(text: &str) -> usize {
    let count = text
        .chars()
        .filter(|c| matches!(c, '.' | '?' | '!'))
        .count();
    // At least 1 sentence if there's text
    count.max(1)
}

fn has_numbered_list(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        let mut chars = trimmed.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some(d), Some('.' | ')')) if d.is_ascii_digit()
        )
    })
}
