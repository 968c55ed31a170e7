// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express, such as
//! non-empty paths, distinct queue parameters and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::TabkeepConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TabkeepConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let item = config.queue.item_param.trim();
    let collection = config.queue.collection_param.trim();
    if item.is_empty() {
        invalid("queue.item_param must not be empty".to_string());
    }
    if collection.is_empty() {
        invalid("queue.collection_param must not be empty".to_string());
    }
    if !item.is_empty() && item == collection {
        invalid(format!(
            "queue.item_param and queue.collection_param must differ, both are `{item}`"
        ));
    }
    if config.queue.max_entries == 0 {
        invalid("queue.max_entries must be at least 1".to_string());
    }

    if config.snapshot.blank_url.trim().is_empty() {
        invalid("snapshot.blank_url must not be empty".to_string());
    }

    if config.bus.event_capacity == 0 {
        invalid("bus.event_capacity must be at least 1".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TabkeepConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TabkeepConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn identical_queue_params_fail_validation() {
        let mut config = TabkeepConfig::default();
        config.queue.collection_param = "v".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must differ"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = TabkeepConfig::default();
        config.queue.max_entries = 0;
        config.bus.event_capacity = 0;
        config.logging.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "logging.level `loud`"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = TabkeepConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
