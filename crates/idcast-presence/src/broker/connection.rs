//! Background WebSocket connection task.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, trace, warn};

use super::handler::handle_packet;
use super::types::{BrokerCommand, BrokerConfig, BrokerEvent};
use crate::mqtt::{self, ConnectReturnCode, Connect, Packet, Publish, QoS, Subscribe};

/// Subscriptions awaiting their SUBACK, by packet id.
pub(crate) type PendingSubscriptions = Arc<RwLock<HashMap<u16, String>>>;

/// WebSocket subprotocol for MQTT.
const MQTT_SUBPROTOCOL: &str = "mqtt";

// ---------------------------------------------------------------------------
// Connection Task
// ---------------------------------------------------------------------------

/// Background task owning the broker socket for one session.
pub(crate) async fn connection_task(
    config: BrokerConfig,
    client_id: String,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<BrokerEvent>,
    command_rx: mpsc::Receiver<BrokerCommand>,
) {
    info!(url = %config.url, client_id = %client_id, "Connecting to MQTT broker");

    let request = match websocket_request(&config.url) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Invalid broker URL");
            let _ = event_tx
                .send(BrokerEvent::Error(format!("Invalid broker URL: {e}")))
                .await;
            return;
        }
    };

    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let ws_stream = match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
        .await
    {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to connect to MQTT broker");
            let _ = event_tx
                .send(BrokerEvent::Error(format!("Connection failed: {e}")))
                .await;
            return;
        }
        Err(_elapsed) => {
            error!(
                "WebSocket connection timed out after {}s",
                config.connect_timeout_secs
            );
            let _ = event_tx
                .send(BrokerEvent::Error(format!(
                    "Connection timed out after {}s",
                    config.connect_timeout_secs
                )))
                .await;
            return;
        }
    };

    let (ws_write, mut ws_read) = ws_stream.split();
    let ws_write = Arc::new(Mutex::new(ws_write));

    let connect = Packet::Connect(Connect {
        client_id,
        keep_alive: config.keep_alive_secs,
        clean_session: true,
    });
    if let Err(e) = send_packet(&ws_write, &connect).await {
        error!(error = %e, "Failed to send CONNECT");
        let _ = event_tx
            .send(BrokerEvent::Error(format!("Connection failed: {e}")))
            .await;
        return;
    }

    let pending: PendingSubscriptions = Arc::new(RwLock::new(HashMap::new()));
    let mut command_rx = Some(command_rx);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    let mut accepted = false;
    let mut failure: Option<String> = None;
    let mut buffer = BytesMut::new();

    'read: while let Some(frame) = ws_read.next().await {
        match frame {
            Ok(WsMessage::Binary(data)) => {
                buffer.extend_from_slice(&data);
                loop {
                    match mqtt::decode(&mut buffer) {
                        Ok(Some(Packet::ConnAck(ack))) if !accepted => {
                            if ack.code != ConnectReturnCode::Accepted {
                                warn!(code = %ack.code, "Broker refused connection");
                                failure = Some(format!("Connection refused: {}", ack.code));
                                break 'read;
                            }
                            accepted = true;
                            *connected.write().await = true;
                            info!(session_present = ack.session_present, "Connected to MQTT broker");

                            if let Some(rx) = command_rx.take() {
                                tasks.push(tokio::spawn(keep_alive_task(
                                    Arc::clone(&ws_write),
                                    config.keep_alive_secs,
                                )));
                                tasks.push(tokio::spawn(command_forwarder(
                                    rx,
                                    Arc::clone(&ws_write),
                                    Arc::clone(&pending),
                                    event_tx.clone(),
                                )));
                            }
                            let _ = event_tx.send(BrokerEvent::Connected).await;
                        }
                        Ok(Some(packet)) => {
                            handle_packet(packet, &pending, &event_tx).await;
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "Malformed MQTT stream");
                            failure = Some(format!("Protocol error: {e}"));
                            break 'read;
                        }
                    }
                }
            }
            Ok(WsMessage::Close(_)) => {
                info!("Broker closed connection");
                break;
            }
            Ok(WsMessage::Text(text)) => {
                debug!(text = %text, "Ignoring text frame from broker");
            }
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup.
    for task in tasks {
        task.abort();
    }
    *connected.write().await = false;

    if accepted {
        let _ = event_tx.send(BrokerEvent::Disconnected).await;
    } else {
        let reason =
            failure.unwrap_or_else(|| "Connection closed before the broker answered".to_string());
        let _ = event_tx.send(BrokerEvent::Error(reason)).await;
    }
}

/// Build the handshake request, asking for the `mqtt` subprotocol.
fn websocket_request(url: &str) -> Result<Request, tokio_tungstenite::tungstenite::Error> {
    let mut request = url.into_client_request()?;
    request.headers_mut().insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(MQTT_SUBPROTOCOL),
    );
    Ok(request)
}

/// Encode a packet and write it as one binary frame.
pub(crate) async fn send_packet<S>(ws_write: &Mutex<S>, packet: &Packet) -> Result<(), String>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let mut buf = BytesMut::new();
    packet.encode(&mut buf).map_err(|e| e.to_string())?;
    let mut writer = ws_write.lock().await;
    writer
        .send(WsMessage::Binary(buf.freeze()))
        .await
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Keep-alive
// ---------------------------------------------------------------------------

async fn keep_alive_task<S>(ws_write: Arc<Mutex<S>>, interval_secs: u16)
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    // A keep-alive of zero disables pinging.
    if interval_secs == 0 {
        return;
    }
    let period = Duration::from_secs(u64::from(interval_secs));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        trace!("PINGREQ");
        if send_packet(&ws_write, &Packet::PingReq).await.is_err() {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Command Forwarder
// ---------------------------------------------------------------------------

async fn command_forwarder<S>(
    mut command_rx: mpsc::Receiver<BrokerCommand>,
    ws_write: Arc<Mutex<S>>,
    pending: PendingSubscriptions,
    event_tx: mpsc::Sender<BrokerEvent>,
) where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let mut next_packet_id: u16 = 1;

    while let Some(command) = command_rx.recv().await {
        match command {
            BrokerCommand::Subscribe { topic } => {
                let packet_id = next_packet_id;
                next_packet_id = next_packet_id.checked_add(1).unwrap_or(1);

                pending.write().await.insert(packet_id, topic.clone());
                let packet = Packet::Subscribe(Subscribe {
                    packet_id,
                    topic: topic.clone(),
                    qos: QoS::AtMostOnce,
                });
                if let Err(e) = send_packet(&ws_write, &packet).await {
                    warn!(topic = %topic, error = %e, "Failed to send SUBSCRIBE");
                    pending.write().await.remove(&packet_id);
                    let _ = event_tx
                        .send(BrokerEvent::SubscribeFailed { topic, reason: e })
                        .await;
                } else {
                    debug!(topic = %topic, packet_id, "SUBSCRIBE sent");
                }
            }
            BrokerCommand::Publish { topic, payload } => {
                let packet = Packet::Publish(Publish::at_most_once(topic.clone(), payload));
                if let Err(e) = send_packet(&ws_write, &packet).await {
                    warn!(topic = %topic, error = %e, "Failed to send PUBLISH");
                }
            }
            BrokerCommand::Disconnect => {
                let _ = send_packet(&ws_write, &Packet::Disconnect).await;
                let mut writer = ws_write.lock().await;
                let _ = writer.send(WsMessage::Close(None)).await;
                return;
            }
        }
    }
}
