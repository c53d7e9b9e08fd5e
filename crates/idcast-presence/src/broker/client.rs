//! Public handle for interacting with the broker connection.

use std::sync::Arc;

use bytes::Bytes;
use idcast_common::ExchangeError;
use tokio::sync::{mpsc, RwLock};

use super::connection::connection_task;
use super::types::{BrokerCommand, BrokerConfig, BrokerEvent};

/// Handle for interacting with the broker connection.
///
/// All methods are non-blocking: they queue a command for the background
/// connection task. Commands issued before the broker accepts the session
/// are held until it does.
pub struct BrokerClient {
    command_tx: mpsc::Sender<BrokerCommand>,
    connected: Arc<RwLock<bool>>,
}

impl BrokerClient {
    /// Create a new client and start the background connection.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: BrokerConfig, client_id: &str) -> (Self, mpsc::Receiver<BrokerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let connected = Arc::new(RwLock::new(false));

        let client = Self {
            command_tx,
            connected: Arc::clone(&connected),
        };

        tokio::spawn(connection_task(
            config,
            client_id.to_string(),
            connected,
            event_tx,
            command_rx,
        ));

        (client, event_rx)
    }

    /// Subscribe to a topic at QoS 0.
    pub async fn subscribe(&self, topic: &str) -> Result<(), ExchangeError> {
        self.send(BrokerCommand::Subscribe {
            topic: topic.to_string(),
        })
        .await
    }

    /// Publish a payload on a topic at QoS 0.
    pub async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), ExchangeError> {
        self.send(BrokerCommand::Publish {
            topic: topic.to_string(),
            payload,
        })
        .await
    }

    /// Check if the broker has accepted the session and it is still up.
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Send DISCONNECT and close the socket.
    pub async fn disconnect(&self) {
        let _ = self.command_tx.send(BrokerCommand::Disconnect).await;
    }

    async fn send(&self, command: BrokerCommand) -> Result<(), ExchangeError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ExchangeError::ConnectionClosed)
    }
}
