// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions implemented by pluggable backends.

pub mod provider;

pub use provider::CapabilityProvider;
