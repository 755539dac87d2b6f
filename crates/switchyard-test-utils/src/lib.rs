// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchyard integration tests.
//!
//! Provides mock providers and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockCapabilityProvider`] - Mock provider with scripted outcomes
//! - [`TestHarness`] - Fully wired routing stack with mocks

pub mod harness;
pub mod mock_provider;

pub use harness::{standard_pricing, TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockCapabilityProvider, ScriptedResponse};
