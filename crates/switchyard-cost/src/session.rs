// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage sessions: bounded units of attributed spend.
//!
//! A session aggregates request counts, token totals, per-model usage,
//! and estimated-vs-actual cost between `start_session` and
//! `end_session`. Ending is idempotent: a second end returns the
//! already-terminal record unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use switchyard_core::types::TokenUsage;
use switchyard_core::SwitchyardError;

/// Terminal or live state of a usage session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Timeout,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Active
    }
}

/// Per-model usage inside one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelUsage {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// Aggregated usage for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cached_requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_tokens: u64,
    pub reasoning_tokens: u64,
    pub per_model: HashMap<String, ModelUsage>,
    pub estimated_cost_usd: f64,
    pub actual_cost_usd: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

impl UsageSession {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Active,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            cached_requests: 0,
            input_tokens: 0,
            output_tokens: 0,
            cached_tokens: 0,
            reasoning_tokens: 0,
            per_model: HashMap::new(),
            estimated_cost_usd: 0.0,
            actual_cost_usd: 0.0,
            avg_latency_ms: 0.0,
            max_latency_ms: 0,
        }
    }

    /// Relative deviation of actual from estimated cost. Zero when
    /// nothing was estimated.
    pub fn cost_variance(&self) -> f64 {
        if self.estimated_cost_usd == 0.0 {
            0.0
        } else {
            (self.actual_cost_usd - self.estimated_cost_usd) / self.estimated_cost_usd
        }
    }

    fn record(
        &mut self,
        provider: &str,
        tokens: &TokenUsage,
        estimated_cost: f64,
        actual_cost: f64,
        success: bool,
        latency_ms: u64,
    ) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
        if tokens.cached_tokens > 0 {
            self.cached_requests += 1;
        }

        self.input_tokens += u64::from(tokens.input_tokens);
        self.output_tokens += u64::from(tokens.output_tokens);
        self.cached_tokens += u64::from(tokens.cached_tokens);
        self.reasoning_tokens += u64::from(tokens.reasoning_tokens);

        self.estimated_cost_usd += estimated_cost;
        self.actual_cost_usd += actual_cost;

        let delta = latency_ms as f64 - self.avg_latency_ms;
        self.avg_latency_ms += delta / self.total_requests as f64;
        self.max_latency_ms = self.max_latency_ms.max(latency_ms);

        let model = self.per_model.entry(provider.to_string()).or_default();
        model.requests += 1;
        model.input_tokens += u64::from(tokens.input_tokens);
        model.output_tokens += u64::from(tokens.output_tokens);
        model.cost_usd += actual_cost;
    }
}

/// Concurrent store of usage sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, UsageSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session. Starting an id that is already active is an
    /// error; restarting a terminal id replaces it.
    pub fn start_session(&self, id: &str) -> Result<(), SwitchyardError> {
        match self.sessions.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied)
                if occupied.get().status.is_terminal() =>
            {
                occupied.insert(UsageSession::new(id));
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(SwitchyardError::InvalidInput(format!(
                    "session `{id}` is already active"
                )))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(UsageSession::new(id));
                Ok(())
            }
        }
    }

    /// Fold one request into an active session.
    pub fn record_request(
        &self,
        id: &str,
        provider: &str,
        tokens: &TokenUsage,
        estimated_cost: f64,
        actual_cost: f64,
        success: bool,
        latency_ms: u64,
    ) -> Result<(), SwitchyardError> {
        let mut session =
            self.sessions
                .get_mut(id)
                .ok_or_else(|| SwitchyardError::SessionNotFound {
                    id: id.to_string(),
                })?;
        session.record(provider, tokens, estimated_cost, actual_cost, success, latency_ms);
        Ok(())
    }

    /// End a session with the given terminal status.
    ///
    /// Idempotent: ending an already-terminal session returns the
    /// existing record unchanged.
    pub fn end_session(
        &self,
        id: &str,
        status: SessionStatus,
    ) -> Result<UsageSession, SwitchyardError> {
        let mut session =
            self.sessions
                .get_mut(id)
                .ok_or_else(|| SwitchyardError::SessionNotFound {
                    id: id.to_string(),
                })?;
        if session.status.is_terminal() {
            return Ok(session.clone());
        }
        session.status = status;
        session.ended_at = Some(Utc::now());
        info!(
            session = id,
            status = ?status,
            requests = session.total_requests,
            actual_cost_usd = session.actual_cost_usd,
            cost_variance = session.cost_variance(),
            "session ended"
        );
        Ok(session.clone())
    }

    pub fn get_session(&self, id: &str) -> Option<UsageSession> {
        self.sessions.get(id).map(|s| s.clone())
    }

    /// Current accumulated actual cost of a session, if it exists.
    pub fn session_cost(&self, id: &str) -> Option<f64> {
        self.sessions.get(id).map(|s| s.actual_cost_usd)
    }
}
