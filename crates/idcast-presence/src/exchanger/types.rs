//! Configuration and state types for the exchanger.

use std::fmt;

/// Session-level settings.
#[derive(Debug, Clone)]
pub struct ExchangerConfig {
    /// The one topic every participant publishes and listens on.
    pub topic: String,
    /// Prefix of the generated MQTT client id.
    pub client_id_prefix: String,
}

impl Default for ExchangerConfig {
    fn default() -> Self {
        Self {
            topic: "idcast-presence".into(),
            client_id_prefix: "idcast".into(),
        }
    }
}

/// `Unconnected → Connecting → Connected`. There is no way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Unconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Unconnected => "unconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Everything a user interface shows for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub status: ConnectionState,
    pub identity: Option<u32>,
    /// Last announcement sent, e.g. `"1: 0.42"`.
    pub sent: Option<String>,
    /// Last announcement received from another identity.
    pub received: Option<String>,
    pub error: Option<String>,
}
