// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-aware adjustment of query analysis.
//!
//! Wraps [`QueryAnalyzer`] and folds four independent, cheap heuristics
//! over the conversation history: continuity, escalation, topic shift,
//! and prior-model performance. Each is additive with a hard cap, so any
//! single strong signal can dominate without runaway scores.

use tracing::debug;

use switchyard_config::AnalyzerConfig;
use switchyard_core::types::ConversationContext;

use crate::query::{ContextFactors, QueryAnalysis, QueryAnalyzer};

/// Adjusts query analysis using conversation history.
pub struct ContextAnalyzer {
    query_analyzer: QueryAnalyzer,
    config: AnalyzerConfig,
}

impl ContextAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            query_analyzer: QueryAnalyzer::new(config.clone()),
            config,
        }
    }

    /// Access the underlying context-free analyzer.
    pub fn query_analyzer(&self) -> &QueryAnalyzer {
        &self.query_analyzer
    }

    /// Analyze a query, adjusted by conversation context when present.
    ///
    /// With no context (or no recorded exchanges) the result is exactly
    /// the base analysis; this path never fails.
    pub fn analyze_with_context(
        &self,
        query: &str,
        context: Option<&ConversationContext>,
    ) -> QueryAnalysis {
        let base = self.query_analyzer.analyze(query);

        let Some(context) = context else {
            return base;
        };
        if context.exchanges.is_empty() {
            return base;
        }

        let continuity = self.continuity_bonus(context);
        let escalation = self.escalation_amount(query, context);
        let topic_shift = self.detect_topic_shift(query, context);
        let performance = self.performance_adjustment(context);

        let complexity = (base.complexity + escalation + continuity).min(10.0);
        let reasoning_depth =
            (base.reasoning_depth + if topic_shift { 2.0 } else { 0.0 }).min(10.0);
        let confidence = (base.confidence * (1.0 + performance)).clamp(0.1, 1.0);

        debug!(
            complexity,
            reasoning_depth,
            confidence,
            continuity,
            escalation,
            topic_shift,
            performance,
            turn_count = context.turn_count,
            "context-adjusted analysis"
        );

        QueryAnalysis {
            complexity,
            reasoning_depth,
            confidence,
            query: base.query,
            context_factors: Some(ContextFactors {
                continuity_bonus: continuity,
                complexity_escalation: escalation,
                topic_shift,
                performance_adjustment: performance,
                turn_count: context.turn_count,
                complexity_hint: context.complexity_hint,
            }),
        }
    }

    /// Established conversations warrant a small complexity bump; a
    /// running summary signals a long-lived thread.
    fn continuity_bonus(&self, context: &ConversationContext) -> f64 {
        let turns = f64::from(context.turn_count) * 0.1;
        let mut bonus = turns.min(self.config.continuity_cap);
        if context.summary.is_some() {
            bonus += 0.3;
        }
        bonus
    }

    /// Escalation: explicit "go deeper" language, a long follow-up after
    /// a short answer, or a question late in the conversation.
    fn escalation_amount(&self, query: &str, context: &ConversationContext) -> f64 {
        let lower = query.to_lowercase();
        let mut amount: f64 = 0.0;

        if self
            .config
            .escalation_terms
            .iter()
            .any(|t| lower.contains(t.to_lowercase().as_str()))
        {
            amount += 2.0;
        }

        if let Some(last) = context.exchanges.last() {
            let response_len = last.response_text.chars().count();
            let query_len = query.chars().count();
            if response_len < self.config.short_response_chars
                && query_len > self.config.long_query_chars
            {
                amount += 1.5;
            }
        }

        if self.query_analyzer.is_interrogative(&lower) && context.exchanges.len() > 1 {
            amount += 0.5;
        }

        amount.min(self.config.escalation_cap)
    }

    /// Topic shift: low keyword overlap between the query and the most
    /// recent response.
    fn detect_topic_shift(&self, query: &str, context: &ConversationContext) -> bool {
        let Some(last) = context.exchanges.last() else {
            return false;
        };
        let current = self.extract_keywords(query);
        let previous = self.extract_keywords(&last.response_text);

        let common = current.iter().filter(|k| previous.contains(k)).count();
        let ratio = common as f64 / current.len().max(1) as f64;
        ratio < self.config.topic_shift_overlap
    }

    /// Prior-model performance: short, failed, or low-tier recent answers
    /// raise the confidence that routing should adapt.
    fn performance_adjustment(&self, context: &ConversationContext) -> f64 {
        let mut adjustment = 0.0;
        let recent = context
            .exchanges
            .iter()
            .rev()
            .take(2);

        for exchange in recent {
            if exchange.response_text.chars().count() < self.config.brief_response_chars {
                adjustment += 0.1;
            }
            if exchange.error.is_some() {
                adjustment += 0.15;
            }
            if exchange.tier.is_some_and(|t| t.as_u8() < 2) {
                adjustment += 0.05;
            }
        }

        f64::min(adjustment, self.config.performance_cap)
    }

    /// Bounded keyword set: lowercased alphanumeric tokens of length >= 3,
    /// stop words removed, deduplicated, capped at `max_keywords`.
    pub(crate) fn extract_keywords(&self, text: &str) -> Vec<String> {
        let mut keywords = Vec::new();
        for token in text.split_whitespace() {
            let word: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.chars().count() < 3 {
                continue;
            }
            if self.config.stop_words.iter().any(|s| s == &word) {
                continue;
            }
            if keywords.contains(&word) {
                continue;
            }
            keywords.push(word);
            if keywords.len() >= self.config.max_keywords {
                break;
            }
        }
        keywords
    }
}
