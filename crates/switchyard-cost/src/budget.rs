// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget periods and threshold alerts.
//!
//! Period windows follow a fixed-offset budget timezone and a
//! configurable monthly reset day (capped at 28 so the anchor exists in
//! every month). Usage is attributed to the period containing the
//! request's completion timestamp.

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use switchyard_config::BudgetConfig;

/// The budget window granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Hourly,
    Daily,
    Monthly,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Hourly => write!(f, "hourly"),
            Period::Daily => write!(f, "daily"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

/// Severity of a budget alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Usage crossed the warning threshold.
    Warning,
    /// Usage crossed the critical threshold.
    Critical,
    /// Usage reached the configured ceiling.
    LimitReached,
    /// A request was rejected because the ceiling was already reached.
    BudgetExceeded,
}

/// An append-only alert record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAlert {
    pub id: Uuid,
    pub alert_type: AlertType,
    /// Which window fired the alert.
    pub period: Period,
    /// The window key (e.g. "2026-08" for monthly).
    pub period_key: String,
    pub current_usage: f64,
    pub limit: f64,
    /// `current_usage / limit`, as a percentage.
    pub percentage: f64,
    /// Per-model spend within the window at alert time.
    pub per_model: HashMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
}

impl CostAlert {
    pub fn new(
        alert_type: AlertType,
        period: Period,
        period_key: String,
        current_usage: f64,
        limit: f64,
        per_model: HashMap<String, f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type,
            period,
            period_key,
            current_usage,
            limit,
            percentage: if limit > 0.0 {
                current_usage / limit * 100.0
            } else {
                0.0
            },
            per_model,
            created_at: Utc::now(),
            acknowledged: false,
            acknowledged_by: None,
        }
    }
}

/// The budget timezone as a fixed offset.
fn budget_offset(config: &BudgetConfig) -> FixedOffset {
    FixedOffset::east_opt(config.utc_offset_minutes * 60)
        .or_else(|| FixedOffset::east_opt(0))
        .expect("zero UTC offset is always valid")
}

/// Stable key naming the window that contains `at`.
pub fn period_key(period: Period, at: DateTime<Utc>, config: &BudgetConfig) -> String {
    let local = at.with_timezone(&budget_offset(config));
    match period {
        Period::Hourly => local.format("%Y-%m-%dT%H").to_string(),
        Period::Daily => local.format("%Y-%m-%d").to_string(),
        Period::Monthly => {
            let (year, month) = monthly_anchor(&local, config.reset_day);
            format!("{year:04}-{month:02}")
        }
    }
}

/// UTC bounds `[start, end)` of the window containing `at`.
pub fn period_bounds(
    period: Period,
    at: DateTime<Utc>,
    config: &BudgetConfig,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let offset = budget_offset(config);
    let local = at.with_timezone(&offset);
    match period {
        Period::Hourly => {
            let start = local
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(local);
            (start.with_timezone(&Utc), (start + Duration::hours(1)).with_timezone(&Utc))
        }
        Period::Daily => {
            let start = local_midnight(&offset, local.year(), local.month(), local.day());
            (start.with_timezone(&Utc), (start + Duration::days(1)).with_timezone(&Utc))
        }
        Period::Monthly => {
            let (year, month) = monthly_anchor(&local, config.reset_day);
            let start = local_midnight(&offset, year, month, config.reset_day);
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            let end = local_midnight(&offset, next_year, next_month, config.reset_day);
            (start.with_timezone(&Utc), end.with_timezone(&Utc))
        }
    }
}

/// Year/month of the monthly window containing the local timestamp.
fn monthly_anchor(local: &DateTime<FixedOffset>, reset_day: u32) -> (i32, u32) {
    if local.day() >= reset_day {
        (local.year(), local.month())
    } else if local.month() == 1 {
        (local.year() - 1, 12)
    } else {
        (local.year(), local.month() - 1)
    }
}

fn local_midnight(offset: &FixedOffset, year: i32, month: u32, day: u32) -> DateTime<FixedOffset> {
    // reset_day is validated to 1..=28, so the date always exists.
    offset
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("validated calendar date is unambiguous in a fixed offset")
}
