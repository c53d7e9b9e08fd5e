//! Incoming packet handler.

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::connection::PendingSubscriptions;
use super::types::BrokerEvent;
use crate::mqtt::{Packet, QoS, SUBACK_FAILURE};

/// Handle one packet received after the session was accepted.
pub(crate) async fn handle_packet(
    packet: Packet,
    pending: &PendingSubscriptions,
    event_tx: &mpsc::Sender<BrokerEvent>,
) {
    match packet {
        Packet::SubAck(ack) => {
            let topic = pending
                .write()
                .await
                .remove(&ack.packet_id)
                .unwrap_or_else(|| format!("<packet {}>", ack.packet_id));
            // One filter per SUBSCRIBE, so one return code.
            let event = match ack.return_codes.first() {
                Some(&code) if code != SUBACK_FAILURE => {
                    debug!(topic = %topic, granted_qos = code, "Subscription acknowledged");
                    BrokerEvent::Subscribed { topic }
                }
                _ => {
                    warn!(topic = %topic, "Subscription rejected by broker");
                    let reason = format!("Subscription to {topic} rejected by broker");
                    BrokerEvent::SubscribeFailed { topic, reason }
                }
            };
            let _ = event_tx.send(event).await;
        }
        Packet::Publish(publish) => {
            if publish.qos != QoS::AtMostOnce {
                debug!(topic = %publish.topic, qos = ?publish.qos, "Publish above QoS 0 is not acknowledged");
            }
            trace!(topic = %publish.topic, bytes = publish.payload.len(), "Message received");
            let _ = event_tx
                .send(BrokerEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload,
                })
                .await;
        }
        Packet::PingResp => {
            trace!("PINGRESP");
        }
        other => {
            debug!(kind = other.kind(), "Unhandled MQTT packet");
        }
    }
}
