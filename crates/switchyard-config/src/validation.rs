// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ordering of alert thresholds, valid strategy names, and non-negative
//! spending ceilings.

use crate::diagnostic::ConfigError;
use crate::model::{SwitchyardConfig, STRATEGY_PRESETS};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SwitchyardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.runtime.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "runtime.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.runtime.log_level
            ),
        });
    }

    if config.runtime.max_concurrency < 1 {
        errors.push(ConfigError::Validation {
            message: "runtime.max_concurrency must be at least 1".to_string(),
        });
    }

    if !STRATEGY_PRESETS.contains(&config.routing.strategy.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "routing.strategy `{}` is not a known preset; valid: {}",
                config.routing.strategy,
                STRATEGY_PRESETS.join(", ")
            ),
        });
    }

    if config.routing.chars_per_token == 0 {
        errors.push(ConfigError::Validation {
            message: "routing.chars_per_token must be at least 1".to_string(),
        });
    }

    // Spending ceilings must be non-negative if set.
    for (key, value) in [
        ("budget.monthly_cap_usd", config.budget.monthly_cap_usd),
        ("budget.daily_cap_usd", config.budget.daily_cap_usd),
        ("budget.hourly_cap_usd", config.budget.hourly_cap_usd),
        ("budget.per_request_cap_usd", config.budget.per_request_cap_usd),
        ("budget.per_session_cap_usd", config.budget.per_session_cap_usd),
    ] {
        if let Some(v) = value
            && v < 0.0
        {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be non-negative, got {v}"),
            });
        }
    }

    let warning = config.budget.warning_threshold;
    let critical = config.budget.critical_threshold;
    if !(0.0..=1.0).contains(&warning) {
        errors.push(ConfigError::Validation {
            message: format!("budget.warning_threshold must be in [0, 1], got {warning}"),
        });
    }
    if !(0.0..=1.0).contains(&critical) {
        errors.push(ConfigError::Validation {
            message: format!("budget.critical_threshold must be in [0, 1], got {critical}"),
        });
    }
    if warning >= critical {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.warning_threshold ({warning}) must be below critical_threshold ({critical})"
            ),
        });
    }

    // Days 29-31 do not exist in every month, so the window anchor is capped.
    if !(1..=28).contains(&config.budget.reset_day) {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.reset_day must be between 1 and 28, got {}",
                config.budget.reset_day
            ),
        });
    }

    // 14h either side covers all real-world offsets.
    if config.budget.utc_offset_minutes.abs() > 14 * 60 {
        errors.push(ConfigError::Validation {
            message: format!(
                "budget.utc_offset_minutes must be within +-840, got {}",
                config.budget.utc_offset_minutes
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.analyzer.topic_shift_overlap) {
        errors.push(ConfigError::Validation {
            message: format!(
                "analyzer.topic_shift_overlap must be in [0, 1], got {}",
                config.analyzer.topic_shift_overlap
            ),
        });
    }

    for (key, value) in [
        ("analyzer.escalation_cap", config.analyzer.escalation_cap),
        ("analyzer.continuity_cap", config.analyzer.continuity_cap),
        ("analyzer.performance_cap", config.analyzer.performance_cap),
    ] {
        if value < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be non-negative, got {value}"),
            });
        }
    }

    if config.analyzer.max_keywords == 0 {
        errors.push(ConfigError::Validation {
            message: "analyzer.max_keywords must be at least 1".to_string(),
        });
    }

    for (key, list) in [
        ("analyzer.escalation_terms", &config.analyzer.escalation_terms),
        ("analyzer.interrogatives", &config.analyzer.interrogatives),
    ] {
        if list.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
