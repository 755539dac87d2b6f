// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost and budget tracking for the Switchyard routing pipeline.
//!
//! Pricing tables, an in-memory request log, usage sessions, budget
//! enforcement with threshold alerts, and usage reporting. The
//! [`CostTracker`] composes all of it behind one service; durable
//! persistence of the log is the embedding system's concern.

pub mod budget;
pub mod log;
pub mod pricing;
pub mod session;
pub mod tracker;

pub use budget::{AlertType, CostAlert, Period};
pub use log::{RequestLog, RequestRecord};
pub use pricing::{CostBreakdown, ModelPricing, PricingBook};
pub use session::{ModelUsage, SessionStatus, SessionStore, UsageSession};
pub use tracker::{
    BudgetStatus, CostTracker, HourlyUsage, ModelReport, PostRequest, PreCheck, UsageReport,
};
