//! MQTT client over WebSocket.
//!
//! A background task owns the socket. It performs the WebSocket handshake
//! (`mqtt` subprotocol), sends CONNECT, and once the broker accepts the
//! session it starts a keep-alive pinger and a command forwarder. Callers
//! talk to it through a cheap [`BrokerClient`] handle and read
//! [`BrokerEvent`]s from a channel. There is no reconnect: when the
//! socket goes away the task reports it and ends.

mod client;
mod connection;
mod handler;
mod types;

pub use client::BrokerClient;
pub use types::{BrokerConfig, BrokerEvent};
