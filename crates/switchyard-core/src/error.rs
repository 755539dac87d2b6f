// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchyard routing pipeline.

use thiserror::Error;

/// The primary error type used across all Switchyard crates.
///
/// An empty candidate set is deliberately *not* represented here: selection
/// returns `Option::None` and the coordinator branches on it.
#[derive(Debug, Error)]
pub enum SwitchyardError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed request, e.g. an empty prompt where one is required.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Lookup against a provider name that was never registered.
    #[error("provider not found: {name}")]
    ProviderNotFound { name: String },

    /// Cost estimate requested for a provider with no registered price table.
    #[error("no pricing registered for provider: {provider}")]
    PricingNotFound { provider: String },

    /// Lookup against an unknown usage session.
    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    /// A budget period ceiling rejected the request during pre-check.
    #[error("budget exceeded: {reason}")]
    BudgetExceeded { reason: String },

    /// A per-request or per-session hard cap rejected the request.
    #[error("budget cap exceeded: {reason}")]
    BudgetCapExceeded { reason: String },

    /// The execution client reported a failure for one request.
    #[error("provider {provider} execution failed: {message}")]
    ExecutionFailed { provider: String, message: String },

    /// A health probe or execution exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
