// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory append-only request log.
//!
//! Every completed request is appended here; period totals and usage
//! reports are derived by scanning. Durable persistence is the embedding
//! system's concern, not this crate's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

use switchyard_core::types::TokenUsage;

/// One completed (or failed) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub provider: String,
    pub tokens: TokenUsage,
    pub cost_usd: f64,
    pub success: bool,
    /// Completion timestamp; period attribution uses this.
    pub recorded_at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn new(
        session_id: Option<&str>,
        provider: &str,
        tokens: TokenUsage,
        cost_usd: f64,
        success: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.map(str::to_string),
            provider: provider.to_string(),
            tokens,
            cost_usd,
            success,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only in-memory log of request records.
#[derive(Debug, Default)]
pub struct RequestLog {
    records: Mutex<Vec<RequestRecord>>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: RequestRecord) {
        self.records.lock().expect("log lock poisoned").push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total cost of records within `[from, to)`.
    pub fn total_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        self.records
            .lock()
            .expect("log lock poisoned")
            .iter()
            .filter(|r| r.recorded_at >= from && r.recorded_at < to)
            .map(|r| r.cost_usd)
            .sum()
    }

    /// Records within `[from, to)`, in append order.
    pub fn records_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<RequestRecord> {
        self.records
            .lock()
            .expect("log lock poisoned")
            .iter()
            .filter(|r| r.recorded_at >= from && r.recorded_at < to)
            .cloned()
            .collect()
    }

    /// Accumulated cost attributed to one session.
    pub fn session_total(&self, session_id: &str) -> f64 {
        self.records
            .lock()
            .expect("log lock poisoned")
            .iter()
            .filter(|r| r.session_id.as_deref() == Some(session_id))
            .map(|r| r.cost_usd)
            .sum()
    }

    /// Fold every record's cost through a caller-supplied key, summing
    /// per key. Used for period and per-model totals.
    pub fn sum_by<K, F>(&self, mut key: F) -> std::collections::HashMap<K, f64>
    where
        K: std::hash::Hash + Eq,
        F: FnMut(&RequestRecord) -> K,
    {
        let mut totals = std::collections::HashMap::new();
        for record in self.records.lock().expect("log lock poisoned").iter() {
            *totals.entry(key(record)).or_insert(0.0) += record.cost_usd;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(session: Option<&str>, cost: f64, success: bool) -> RequestRecord {
        RequestRecord::new(session, "sonnet", TokenUsage::default(), cost, success)
    }

    #[test]
    fn append_and_count() {
        let log = RequestLog::new();
        assert!(log.is_empty());
        log.append(record(None, 0.01, true));
        log.append(record(None, 0.02, false));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn session_total_sums_only_that_session() {
        let log = RequestLog::new();
        log.append(record(Some("a"), 0.01, true));
        log.append(record(Some("a"), 0.02, true));
        log.append(record(Some("b"), 0.50, true));
        log.append(record(None, 0.25, true));
        assert!((log.session_total("a") - 0.03).abs() < 1e-12);
        assert!((log.session_total("b") - 0.50).abs() < 1e-12);
    }

    #[test]
    fn total_between_respects_bounds() {
        let log = RequestLog::new();
        let mut old = record(None, 1.0, true);
        old.recorded_at = Utc::now() - Duration::days(2);
        log.append(old);
        log.append(record(None, 0.5, true));

        let from = Utc::now() - Duration::hours(1);
        let to = Utc::now() + Duration::hours(1);
        assert!((log.total_between(from, to) - 0.5).abs() < 1e-12);
        assert_eq!(log.records_between(from, to).len(), 1);
    }

    #[test]
    fn sum_by_groups_per_provider() {
        let log = RequestLog::new();
        log.append(record(None, 0.1, true));
        log.append(record(None, 0.2, true));
        let totals = log.sum_by(|r| r.provider.clone());
        assert!((totals["sonnet"] - 0.3).abs() < 1e-12);
    }
}
