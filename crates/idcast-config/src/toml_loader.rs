//! Reading, repairing and seeding the TOML config file.

use std::path::{Path, PathBuf};

use idcast_common::ConfigError;
use tracing::{info, warn};

use crate::schema::{BrokerSection, IdcastConfig, IdentitySection};
use crate::validation;

/// Read the config at `path`.
///
/// Absent keys take their defaults. A section holding bad values is reset
/// to its defaults on its own, so a wrong keep-alive does not also throw
/// away a custom topic in the same file or the identity choices.
pub fn load_from_path(path: &Path) -> Result<IdcastConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("cannot read {}: {e}", path.display())))?;
    let parsed: IdcastConfig = toml::from_str(&text)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    let config = reset_invalid_sections(parsed);
    info!(path = %path.display(), topic = %config.broker.topic, "Config loaded");
    Ok(config)
}

/// Replace each section that fails validation with its defaults.
fn reset_invalid_sections(mut config: IdcastConfig) -> IdcastConfig {
    let broker = validation::broker_problems(&config.broker);
    if !broker.is_empty() {
        warn!(problems = %broker.join("; "), "Resetting [broker] to defaults");
        config.broker = BrokerSection::default();
    }

    let identity = validation::identity_problems(&config.identity);
    if !identity.is_empty() {
        warn!(problems = %identity.join("; "), "Resetting [identity] to defaults");
        config.identity = IdentitySection::default();
    }

    config
}

/// Read the config from its platform location, seeding the file on first run.
///
/// On Linux this is `~/.config/idcast/config.toml`.
pub fn load_default() -> Result<IdcastConfig, ConfigError> {
    let path = default_config_path()?;
    if path.exists() {
        return load_from_path(&path);
    }

    create_default_config(&path)?;
    Ok(IdcastConfig::default())
}

/// `<platform config dir>/idcast/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("no config directory on this platform".into()))?;
    Ok(base.join("idcast").join("config.toml"))
}

/// Write the commented starter config to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let seed_error =
        |e: std::io::Error| ConfigError::ParseError(format!("cannot seed {}: {e}", path.display()));

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(seed_error)?;
    }
    std::fs::write(path, default_config_toml()).map_err(seed_error)?;

    info!(path = %path.display(), "Wrote starter config");
    Ok(())
}

/// Starter config: the shared topic is set, everything else shown commented out.
fn default_config_toml() -> String {
    r##"# idcast configuration
# Only override what you want to change -- missing fields use defaults.

[broker]
# url = "ws://test.mosquitto.org:8080/ws"   # ws:// or wss://
# Make the topic unique to your project, e.g. "JaneDoeLabPresence".
topic = "idcast-presence"
# keep_alive_secs = 60       # 5-3600
# connect_timeout_secs = 15  # 1-120
# client_id_prefix = "idcast"

[identity]
# choices = [1, 2]

[logging]
# level = "idcast=info"
"##
    .to_string()
}
