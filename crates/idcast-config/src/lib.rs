//! idcast configuration.
//!
//! TOML-based configuration with full validation. All sections use
//! defaults so partial configs (or no config at all) work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use idcast_config::{config_to_json, load_config};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BrokerSection, IdcastConfig, IdentitySection, LoggingSection};

use std::path::Path;

use idcast_common::ConfigError;

/// Load config from `path` if given, otherwise from the platform default path.
///
/// The default path is created with documented defaults when missing. An
/// explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<IdcastConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &IdcastConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&IdcastConfig::default());
        assert!(json.contains("\"broker\""));
        assert!(json.contains("\"identity\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("test.mosquitto.org"));
    }

    #[test]
    fn load_config_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idcast.toml");
        std::fs::write(&path, "[broker]\ntopic = \"my-room\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.broker.topic, "my-room");
    }

    #[test]
    fn load_config_with_missing_explicit_path_fails() {
        let result = load_config(Some(Path::new("/tmp/nonexistent_idcast_config.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
