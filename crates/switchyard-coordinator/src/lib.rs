// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing coordinator for the Switchyard pipeline.
//!
//! Wires the context-aware analyzer, the capability registry, and the
//! cost tracker into a single [`RoutingCoordinator::route`] entry point,
//! plus a bounded-concurrency batch variant.
//!
//! [`RoutingCoordinator::route`]: coordinator::RoutingCoordinator::route

pub mod coordinator;

pub use coordinator::{RouteOutcome, RoutingCoordinator};
