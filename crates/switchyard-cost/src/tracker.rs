// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cost tracker: pricing, request log, sessions, budget
//! enforcement, threshold alerts, and usage reports in one service.
//!
//! Budget rejection is a structured outcome (`PreCheck.approved ==
//! false`), not an `Err`; only a missing price table is fatal to a
//! request. Alerts are append-only and deduplicated per (type, window).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use switchyard_config::BudgetConfig;
use switchyard_core::types::TokenUsage;
use switchyard_core::SwitchyardError;

use crate::budget::{period_bounds, period_key, AlertType, CostAlert, Period};
use crate::log::{RequestLog, RequestRecord};
use crate::pricing::PricingBook;
use crate::session::{SessionStatus, SessionStore, UsageSession};

/// Outcome of a pre-flight budget check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreCheck {
    /// Whether the request may proceed.
    pub approved: bool,
    /// Estimated cost of the request in USD.
    pub estimated_cost: f64,
    /// Non-fatal warnings (threshold crossings).
    pub warnings: Vec<String>,
    /// Rejection reason when not approved.
    pub reason: Option<String>,
}

/// Summary returned after recording a completed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub record_id: Uuid,
    pub actual_cost: f64,
    /// `(actual - estimated) / estimated`; zero when nothing was
    /// estimated.
    pub cost_variance: f64,
    /// Alert types fired by this request, in severity order.
    pub alerts_fired: Vec<AlertType>,
}

/// Snapshot of the budget position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Spend in the current monthly window.
    pub current_usage: f64,
    /// Tightest remaining headroom across configured caps, if any cap
    /// is set.
    pub remaining: Option<f64>,
    /// Hard stop: false means requests must be rejected.
    pub can_proceed: bool,
    pub unacknowledged_warnings: usize,
}

/// Per-provider slice of a usage report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelReport {
    pub requests: u64,
    pub successful_requests: u64,
    pub cost_usd: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One hour of the report time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyUsage {
    pub hour: DateTime<Utc>,
    pub cost_usd: f64,
    pub requests: u64,
}

/// Aggregated usage over a requested range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_cost_usd: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub per_model: HashMap<String, ModelReport>,
    pub hourly: Vec<HourlyUsage>,
    /// Total cost divided by successful requests; zero when none.
    pub cost_per_successful_request: f64,
    /// Output tokens per input token; zero when no input.
    pub token_efficiency: f64,
    /// Advisory suggestions; never enforced.
    pub recommendations: Vec<String>,
}

/// Composed cost/budget service.
pub struct CostTracker {
    pricing: PricingBook,
    log: RequestLog,
    sessions: SessionStore,
    budget: RwLock<BudgetConfig>,
    alerts: Mutex<Vec<CostAlert>>,
    fired: Mutex<HashSet<(AlertType, Period, String)>>,
}

impl CostTracker {
    pub fn new(budget: BudgetConfig, pricing: PricingBook) -> Self {
        Self {
            pricing,
            log: RequestLog::new(),
            sessions: SessionStore::new(),
            budget: RwLock::new(budget),
            alerts: Mutex::new(Vec::new()),
            fired: Mutex::new(HashSet::new()),
        }
    }

    pub fn pricing(&self) -> &PricingBook {
        &self.pricing
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    /// Replace the active budget configuration.
    pub fn set_budget(&self, budget: BudgetConfig) {
        *self.budget.write().expect("budget lock poisoned") = budget;
        info!("budget configuration replaced");
    }

    fn budget_snapshot(&self) -> BudgetConfig {
        self.budget.read().expect("budget lock poisoned").clone()
    }

    /// Pre-flight check: estimate the request's cost and test it against
    /// per-request, per-session, and period ceilings.
    ///
    /// Rejection is reported in the returned value; the only `Err` here
    /// is a missing price table.
    pub fn pre_request_check(
        &self,
        session_id: Option<&str>,
        provider: &str,
        estimated_tokens: &TokenUsage,
    ) -> Result<PreCheck, SwitchyardError> {
        let estimated_cost = self.pricing.estimate(provider, estimated_tokens)?.total_usd;
        let budget = self.budget_snapshot();
        let now = Utc::now();

        let mut warnings = Vec::new();

        if let Some(cap) = budget.per_request_cap_usd
            && estimated_cost > cap
        {
            return Ok(PreCheck {
                approved: false,
                estimated_cost,
                warnings,
                reason: Some(format!(
                    "estimated cost ${estimated_cost:.4} exceeds per-request cap ${cap:.4}"
                )),
            });
        }

        if let Some(cap) = budget.per_session_cap_usd
            && let Some(id) = session_id
        {
            let session_cost = self.sessions.session_cost(id).unwrap_or(0.0);
            if session_cost + estimated_cost > cap {
                return Ok(PreCheck {
                    approved: false,
                    estimated_cost,
                    warnings,
                    reason: Some(format!(
                        "session `{id}` at ${session_cost:.4} would exceed per-session cap ${cap:.4}"
                    )),
                });
            }
        }

        for (period, cap) in configured_caps(&budget) {
            let (from, to) = period_bounds(period, now, &budget);
            let usage = self.log.total_between(from, to);
            let projected = usage + estimated_cost;

            if projected >= cap {
                if budget.auto_pause_at_limit {
                    self.fire_budget_exceeded(period, now, usage, cap, &budget);
                    return Ok(PreCheck {
                        approved: false,
                        estimated_cost,
                        warnings,
                        reason: Some(format!(
                            "{period} budget of ${cap:.2} reached (${usage:.4} spent)"
                        )),
                    });
                }
                warnings.push(format!("{period} budget of ${cap:.2} reached"));
            } else if projected >= cap * budget.critical_threshold {
                warnings.push(format!(
                    "{period} spend at {:.0}% of ${cap:.2} cap",
                    projected / cap * 100.0
                ));
            } else if projected >= cap * budget.warning_threshold {
                warnings.push(format!(
                    "{period} spend approaching ${cap:.2} cap ({:.0}%)",
                    projected / cap * 100.0
                ));
            }
        }

        Ok(PreCheck {
            approved: true,
            estimated_cost,
            warnings,
            reason: None,
        })
    }

    /// Record actual usage without estimate bookkeeping.
    pub fn track_usage(
        &self,
        session_id: Option<&str>,
        provider: &str,
        actual_tokens: &TokenUsage,
        actual_cost: f64,
    ) -> Result<PostRequest, SwitchyardError> {
        self.post_request(
            session_id,
            provider,
            actual_cost,
            actual_tokens,
            actual_cost,
            true,
            0,
        )
    }

    /// Record one completed request: append to the log, fold into the
    /// session (when one is named), and evaluate budget thresholds.
    ///
    /// Partial usage from a failed request is billed as actual usage.
    #[allow(clippy::too_many_arguments)]
    pub fn post_request(
        &self,
        session_id: Option<&str>,
        provider: &str,
        estimated_cost: f64,
        actual_tokens: &TokenUsage,
        actual_cost: f64,
        success: bool,
        latency_ms: u64,
    ) -> Result<PostRequest, SwitchyardError> {
        let record = RequestRecord::new(session_id, provider, *actual_tokens, actual_cost, success);
        let record_id = record.id;
        let recorded_at = record.recorded_at;
        self.log.append(record);

        if let Some(id) = session_id {
            self.sessions.record_request(
                id,
                provider,
                actual_tokens,
                estimated_cost,
                actual_cost,
                success,
                latency_ms,
            )?;
        }

        let cost_variance = if estimated_cost == 0.0 {
            0.0
        } else {
            (actual_cost - estimated_cost) / estimated_cost
        };

        let alerts_fired = self.evaluate_thresholds(recorded_at);

        info!(
            provider,
            session = session_id.unwrap_or("-"),
            cost_usd = actual_cost,
            cost_variance,
            success,
            latency_ms,
            "request cost recorded"
        );

        Ok(PostRequest {
            record_id,
            actual_cost,
            cost_variance,
            alerts_fired,
        })
    }

    /// Evaluate every configured cap against its current window, firing
    /// at most one alert per (type, window).
    fn evaluate_thresholds(&self, at: DateTime<Utc>) -> Vec<AlertType> {
        let budget = self.budget_snapshot();
        let mut fired_now = Vec::new();

        for (period, cap) in configured_caps(&budget) {
            let (from, to) = period_bounds(period, at, &budget);
            let usage = self.log.total_between(from, to);
            let fraction = usage / cap;

            let alert_type = if fraction >= 1.0 {
                AlertType::LimitReached
            } else if fraction >= budget.critical_threshold {
                AlertType::Critical
            } else if fraction >= budget.warning_threshold {
                AlertType::Warning
            } else {
                continue;
            };

            let key = period_key(period, at, &budget);
            if self.fire_alert(alert_type, period, key, usage, cap, from, to) {
                fired_now.push(alert_type);
            }
        }

        fired_now
    }

    fn fire_budget_exceeded(
        &self,
        period: Period,
        at: DateTime<Utc>,
        usage: f64,
        cap: f64,
        budget: &BudgetConfig,
    ) {
        let key = period_key(period, at, budget);
        let (from, to) = period_bounds(period, at, budget);
        self.fire_alert(AlertType::BudgetExceeded, period, key, usage, cap, from, to);
    }

    /// Returns true when the alert was new for its window.
    #[allow(clippy::too_many_arguments)]
    fn fire_alert(
        &self,
        alert_type: AlertType,
        period: Period,
        key: String,
        usage: f64,
        cap: f64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> bool {
        let mut fired = self.fired.lock().expect("alert lock poisoned");
        if !fired.insert((alert_type, period, key.clone())) {
            return false;
        }
        drop(fired);

        let per_model = self
            .log
            .records_between(from, to)
            .into_iter()
            .fold(HashMap::new(), |mut acc, r| {
                *acc.entry(r.provider).or_insert(0.0) += r.cost_usd;
                acc
            });

        let alert = CostAlert::new(alert_type, period, key, usage, cap, per_model);
        warn!(
            alert = ?alert_type,
            period = %period,
            period_key = %alert.period_key,
            usage_usd = usage,
            cap_usd = cap,
            percentage = alert.percentage,
            "budget alert"
        );
        self.alerts.lock().expect("alert lock poisoned").push(alert);
        true
    }

    /// All alerts, in firing order.
    pub fn alerts(&self) -> Vec<CostAlert> {
        self.alerts.lock().expect("alert lock poisoned").clone()
    }

    /// Mark an alert acknowledged.
    pub fn acknowledge(&self, id: Uuid, actor: &str) -> Result<(), SwitchyardError> {
        let mut alerts = self.alerts.lock().expect("alert lock poisoned");
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| SwitchyardError::InvalidInput(format!("unknown alert id `{id}`")))?;
        alert.acknowledged = true;
        alert.acknowledged_by = Some(actor.to_string());
        Ok(())
    }

    /// Current budget position. `can_proceed == false` is a hard stop.
    pub fn check_budget_status(&self) -> BudgetStatus {
        let budget = self.budget_snapshot();
        let now = Utc::now();

        let (month_from, month_to) = period_bounds(Period::Monthly, now, &budget);
        let current_usage = self.log.total_between(month_from, month_to);

        let mut remaining: Option<f64> = None;
        let mut exhausted = false;
        for (period, cap) in configured_caps(&budget) {
            let (from, to) = period_bounds(period, now, &budget);
            let usage = self.log.total_between(from, to);
            let headroom = (cap - usage).max(0.0);
            remaining = Some(remaining.map_or(headroom, |r: f64| r.min(headroom)));
            if usage >= cap {
                exhausted = true;
            }
        }

        let unacknowledged_warnings = self
            .alerts
            .lock()
            .expect("alert lock poisoned")
            .iter()
            .filter(|a| !a.acknowledged)
            .count();

        BudgetStatus {
            current_usage,
            remaining,
            can_proceed: !(exhausted && budget.auto_pause_at_limit),
            unacknowledged_warnings,
        }
    }

    /// Aggregate usage over `[from, to)`.
    pub fn generate_report(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> UsageReport {
        let records = self.log.records_between(from, to);

        let mut per_model: HashMap<String, ModelReport> = HashMap::new();
        let mut hourly: HashMap<DateTime<Utc>, HourlyUsage> = HashMap::new();
        let mut total_cost = 0.0;
        let mut successful = 0u64;
        let mut input_tokens = 0u64;
        let mut output_tokens = 0u64;
        let mut cached_tokens = 0u64;
        let mut failed = 0u64;

        for record in &records {
            total_cost += record.cost_usd;
            if record.success {
                successful += 1;
            } else {
                failed += 1;
            }
            input_tokens += u64::from(record.tokens.input_tokens);
            output_tokens += u64::from(record.tokens.output_tokens);
            cached_tokens += u64::from(record.tokens.cached_tokens);

            let model = per_model.entry(record.provider.clone()).or_default();
            model.requests += 1;
            if record.success {
                model.successful_requests += 1;
            }
            model.cost_usd += record.cost_usd;
            model.input_tokens += u64::from(record.tokens.input_tokens);
            model.output_tokens += u64::from(record.tokens.output_tokens);

            let hour = record
                .recorded_at
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(record.recorded_at);
            let slot = hourly.entry(hour).or_insert(HourlyUsage {
                hour,
                cost_usd: 0.0,
                requests: 0,
            });
            slot.cost_usd += record.cost_usd;
            slot.requests += 1;
        }

        let mut hourly: Vec<HourlyUsage> = hourly.into_values().collect();
        hourly.sort_by_key(|h| h.hour);

        let total_requests = records.len() as u64;
        let cost_per_successful_request = if successful > 0 {
            total_cost / successful as f64
        } else {
            0.0
        };
        let token_efficiency = if input_tokens > 0 {
            output_tokens as f64 / input_tokens as f64
        } else {
            0.0
        };

        let recommendations = build_recommendations(
            &per_model,
            total_cost,
            total_requests,
            failed,
            input_tokens,
            cached_tokens,
        );

        UsageReport {
            from,
            to,
            total_cost_usd: total_cost,
            total_requests,
            successful_requests: successful,
            per_model,
            hourly,
            cost_per_successful_request,
            token_efficiency,
            recommendations,
        }
    }

    // Session passthroughs, so embedders hold one service.

    pub fn start_session(&self, id: &str) -> Result<(), SwitchyardError> {
        self.sessions.start_session(id)
    }

    pub fn end_session(
        &self,
        id: &str,
        status: SessionStatus,
    ) -> Result<UsageSession, SwitchyardError> {
        self.sessions.end_session(id, status)
    }

    pub fn get_session(&self, id: &str) -> Option<UsageSession> {
        self.sessions.get_session(id)
    }
}

/// The period caps actually configured.
fn configured_caps(budget: &BudgetConfig) -> Vec<(Period, f64)> {
    [
        (Period::Hourly, budget.hourly_cap_usd),
        (Period::Daily, budget.daily_cap_usd),
        (Period::Monthly, budget.monthly_cap_usd),
    ]
    .into_iter()
    .filter_map(|(p, cap)| cap.map(|c| (p, c)))
    .collect()
}

fn build_recommendations(
    per_model: &HashMap<String, ModelReport>,
    total_cost: f64,
    total_requests: u64,
    failed: u64,
    input_tokens: u64,
    cached_tokens: u64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if cached_tokens == 0 && input_tokens > 50_000 {
        recommendations.push(
            "no cached tokens observed despite large input volume; consider prompt caching"
                .to_string(),
        );
    }

    if total_cost > 0.0
        && let Some((name, model)) = per_model
            .iter()
            .max_by(|a, b| a.1.cost_usd.total_cmp(&b.1.cost_usd))
        && model.cost_usd / total_cost > 0.8
        && per_model.len() > 1
    {
        recommendations.push(format!(
            "`{name}` accounts for {:.0}% of spend; review whether cheaper tiers could serve part of that traffic",
            model.cost_usd / total_cost * 100.0
        ));
    }

    if total_requests > 0 && failed as f64 / total_requests as f64 > 0.2 {
        recommendations.push(
            "over 20% of requests failed; failed requests still bill partial usage".to_string(),
        );
    }

    recommendations
}
