//! Configuration and event/command enums for the broker client.

use bytes::Bytes;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where and how to reach the broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// MQTT-over-WebSocket URL, e.g. `ws://test.mosquitto.org:8080/ws`.
    pub url: String,
    /// Keep-alive announced in CONNECT; a PINGREQ is sent this often.
    pub keep_alive_secs: u16,
    /// Bound on the WebSocket handshake.
    pub connect_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "ws://test.mosquitto.org:8080/ws".into(),
            keep_alive_secs: 60,
            connect_timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by the connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// The broker accepted the session (CONNACK return code 0).
    Connected,
    Subscribed {
        topic: String,
    },
    SubscribeFailed {
        topic: String,
        reason: String,
    },
    Message {
        topic: String,
        payload: Bytes,
    },
    /// An accepted session ended.
    Disconnected,
    /// The session could not be established.
    Error(String),
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) enum BrokerCommand {
    Subscribe { topic: String },
    Publish { topic: String, payload: Bytes },
    Disconnect,
}
