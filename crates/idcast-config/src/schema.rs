//! Configuration schema types for idcast.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdcastConfig {
    pub broker: BrokerSection,
    pub identity: IdentitySection,
    pub logging: LoggingSection,
}

// =============================================================================
// Broker
// =============================================================================

/// Where to connect and which topic to share.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSection {
    /// MQTT-over-WebSocket URL (`ws://` or `wss://`).
    pub url: String,
    /// Shared topic. Pick something unique to your deployment; public
    /// brokers carry plenty of unrelated traffic.
    pub topic: String,
    /// MQTT keep-alive in seconds.
    pub keep_alive_secs: u32,
    /// Upper bound on the WebSocket handshake.
    pub connect_timeout_secs: u32,
    /// Prefix of the generated MQTT client id.
    pub client_id_prefix: String,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            url: "ws://test.mosquitto.org:8080/ws".into(),
            topic: "idcast-presence".into(),
            keep_alive_secs: 60,
            connect_timeout_secs: 15,
            client_id_prefix: "idcast".into(),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The identities a user may pick from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    pub choices: Vec<u32>,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self { choices: vec![1, 2] }
    }
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing-subscriber` filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "idcast=info".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: IdcastConfig = toml::from_str("").unwrap();
        assert_eq!(config.broker.url, "ws://test.mosquitto.org:8080/ws");
        assert_eq!(config.broker.keep_alive_secs, 60);
        assert_eq!(config.identity.choices, vec![1, 2]);
        assert_eq!(config.logging.level, "idcast=info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: IdcastConfig = toml::from_str(
            r#"
[broker]
topic = "lab-42"

[identity]
choices = [7]
"#,
        )
        .unwrap();
        assert_eq!(config.broker.topic, "lab-42");
        assert_eq!(config.broker.client_id_prefix, "idcast");
        assert_eq!(config.identity.choices, vec![7]);
    }
}
