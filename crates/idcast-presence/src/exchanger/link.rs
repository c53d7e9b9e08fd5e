//! Seams between the exchanger and the transport.

use async_trait::async_trait;
use bytes::Bytes;
use idcast_common::ExchangeError;
use tokio::sync::mpsc;

use crate::broker::{BrokerClient, BrokerConfig, BrokerEvent};

/// A live handle to the broker.
#[async_trait]
pub trait Link: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), ExchangeError>;

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), ExchangeError>;
}

/// Opens broker connections.
pub trait Connector {
    type Link: Link;

    /// Start connecting. Progress and incoming messages arrive on the
    /// returned receiver.
    fn connect(&self, client_id: &str) -> (Self::Link, mpsc::Receiver<BrokerEvent>);
}

/// Connects to a real MQTT-over-WebSocket broker.
#[derive(Debug, Clone, Default)]
pub struct BrokerConnector {
    config: BrokerConfig,
}

impl BrokerConnector {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }
}

impl Connector for BrokerConnector {
    type Link = BrokerClient;

    fn connect(&self, client_id: &str) -> (BrokerClient, mpsc::Receiver<BrokerEvent>) {
        BrokerClient::connect(self.config.clone(), client_id)
    }
}

#[async_trait]
impl Link for BrokerClient {
    async fn subscribe(&self, topic: &str) -> Result<(), ExchangeError> {
        BrokerClient::subscribe(self, topic).await
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), ExchangeError> {
        BrokerClient::publish(self, topic, payload).await
    }
}
