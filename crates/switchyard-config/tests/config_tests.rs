// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading, merging, and diagnostics.

use switchyard_config::{load_and_validate_str, ConfigError, SwitchyardConfig};

#[test]
fn empty_config_yields_all_defaults() {
    let config = load_and_validate_str("").expect("empty config should load");
    assert_eq!(config.runtime.log_level, "info");
    assert_eq!(config.runtime.max_concurrency, 4);
    assert_eq!(config.runtime.probe_timeout_ms, 2000);
    assert_eq!(config.routing.strategy, "balanced");
    assert_eq!(config.routing.chars_per_token, 4);
    assert_eq!(config.routing.estimated_output_tokens, 1024);
    assert_eq!(config.budget.warning_threshold, 0.8);
    assert_eq!(config.budget.critical_threshold, 0.95);
    assert!(config.budget.auto_pause_at_limit);
    assert_eq!(config.budget.reset_day, 1);
    assert_eq!(config.budget.utc_offset_minutes, 0);
    assert!(config.budget.monthly_cap_usd.is_none());
}

#[test]
fn analyzer_defaults_are_bilingual() {
    let config = SwitchyardConfig::default();
    assert!(config
        .analyzer
        .escalation_terms
        .iter()
        .any(|t| t == "explain"));
    assert!(config
        .analyzer
        .escalation_terms
        .iter()
        .any(|t| t == "詳しく"));
    assert_eq!(config.analyzer.topic_shift_overlap, 0.3);
    assert_eq!(config.analyzer.escalation_cap, 3.0);
    assert_eq!(config.analyzer.continuity_cap, 1.5);
    assert_eq!(config.analyzer.performance_cap, 0.3);
    assert_eq!(config.analyzer.max_keywords, 10);
}

#[test]
fn partial_section_merges_over_defaults() {
    let toml = r#"
[budget]
monthly_cap_usd = 250.0
reset_day = 15

[routing]
strategy = "cost-optimized"
"#;
    let config = load_and_validate_str(toml).expect("partial config should load");
    assert_eq!(config.budget.monthly_cap_usd, Some(250.0));
    assert_eq!(config.budget.reset_day, 15);
    // Untouched keys keep defaults.
    assert_eq!(config.budget.warning_threshold, 0.8);
    assert_eq!(config.routing.strategy, "cost-optimized");
    assert_eq!(config.routing.chars_per_token, 4);
}

#[test]
fn unknown_key_is_rejected_with_suggestion() {
    let toml = r#"
[budget]
monthly_cap_usd = 100.0
reset_dya = 3
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    let unknown = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    let (key, suggestion) = unknown.expect("expected an unknown key error");
    assert_eq!(key, "reset_dya");
    assert_eq!(suggestion.as_deref(), Some("reset_day"));
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[budgets]
monthly_cap_usd = 100.0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "budgets")));
}

#[test]
fn wrong_type_reports_invalid_type() {
    let toml = r#"
[runtime]
max_concurrency = "lots"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn validation_errors_surface_through_entry_point() {
    let toml = r#"
[budget]
reset_day = 31
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("reset_day"))));
}

#[test]
fn keyword_lists_can_be_replaced() {
    let toml = r#"
[analyzer]
escalation_terms = ["dig in"]
"#;
    let config = load_and_validate_str(toml).expect("override should load");
    assert_eq!(config.analyzer.escalation_terms, vec!["dig in".to_string()]);
    // Other lists keep defaults.
    assert!(!config.analyzer.stop_words.is_empty());
}

#[test]
fn config_round_trips_through_toml() {
    let config = SwitchyardConfig::default();
    let serialized = toml::to_string(&config).expect("serialize");
    let parsed: SwitchyardConfig = toml::from_str(&serialized).expect("reparse");
    assert_eq!(parsed.routing.strategy, config.routing.strategy);
    assert_eq!(parsed.budget.reset_day, config.budget.reset_day);
}
