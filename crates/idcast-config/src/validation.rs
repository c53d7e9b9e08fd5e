//! Full configuration validation.
//!
//! Collects every problem into a single `ConfigError::ValidationError`.

use std::collections::HashSet;

use idcast_common::ConfigError;

use crate::schema::{BrokerSection, IdcastConfig, IdentitySection};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &IdcastConfig) -> Result<(), ConfigError> {
    let mut errors = broker_problems(&config.broker);
    errors.extend(identity_problems(&config.identity));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Everything wrong with the `[broker]` section.
pub fn broker_problems(broker: &BrokerSection) -> Vec<String> {
    let mut errors = Vec::new();

    let url = broker.url.as_str();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(format!("broker.url = {url:?} must start with ws:// or wss://"));
    }
    validate_topic(&mut errors, &broker.topic);
    validate_range(
        &mut errors,
        "broker.keep_alive_secs",
        broker.keep_alive_secs,
        5,
        3600,
    );
    validate_range(
        &mut errors,
        "broker.connect_timeout_secs",
        broker.connect_timeout_secs,
        1,
        120,
    );
    if broker.client_id_prefix.trim().is_empty() {
        errors.push("broker.client_id_prefix must not be empty".into());
    }

    errors
}

/// Everything wrong with the `[identity]` section.
pub fn identity_problems(identity: &IdentitySection) -> Vec<String> {
    let mut errors = Vec::new();

    if identity.choices.is_empty() {
        errors.push("identity.choices must not be empty".into());
    }
    let mut seen = HashSet::new();
    for id in &identity.choices {
        if !seen.insert(id) {
            errors.push(format!("identity.choices contains duplicate identity {id}"));
        }
    }

    errors
}

fn validate_topic(errors: &mut Vec<String>, topic: &str) {
    if topic.is_empty() {
        errors.push("broker.topic must not be empty".into());
    } else if topic.contains(['+', '#']) {
        errors.push(format!("broker.topic = {topic:?} must not contain wildcards"));
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
