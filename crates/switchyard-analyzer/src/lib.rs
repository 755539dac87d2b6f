// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query and conversation-context analysis for the Switchyard routing
//! pipeline.
//!
//! Two layers: [`QueryAnalyzer`] scores a prompt in isolation using
//! lexical heuristics; [`ContextAnalyzer`] wraps it and adjusts scores
//! from conversation history. Both are pure and synchronous, so routing
//! decisions add no latency.

pub mod context;
pub mod query;

pub use context::ContextAnalyzer;
pub use query::{ContextFactors, QueryAnalysis, QueryAnalyzer};
