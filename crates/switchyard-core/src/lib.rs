// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchyard routing pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Switchyard workspace. Every capability
//! provider implements the contract defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SwitchyardError;
pub use traits::CapabilityProvider;
pub use types::{
    ConversationContext, Exchange, ExecutionFailure, ExecutionOutcome, HealthStatus,
    ProviderCall, ProviderDescriptor, ProviderDetail, ProviderKind, RouteRequest, TaskType,
    Tier, TokenUsage,
};
