//! The presence exchange session object.

use bytes::Bytes;
use idcast_common::ExchangeError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::link::{Connector, Link};
use super::types::{ConnectionState, DisplayState, ExchangerConfig};
use crate::broker::BrokerEvent;
use crate::protocol::Announcement;

/// Owns the identity, the broker link and the display state of one session.
///
/// Not shared between tasks: the owner feeds it user actions and
/// [`BrokerEvent`]s one at a time, and each call runs to completion.
pub struct PresenceExchanger<C: Connector> {
    connector: C,
    config: ExchangerConfig,
    identity: Option<u32>,
    link: Option<C::Link>,
    state: ConnectionState,
    display: watch::Sender<DisplayState>,
}

impl<C: Connector> PresenceExchanger<C> {
    pub fn new(connector: C, config: ExchangerConfig) -> Self {
        let (display, _) = watch::channel(DisplayState::default());
        Self {
            connector,
            config,
            identity: None,
            link: None,
            state: ConnectionState::Unconnected,
            display,
        }
    }

    /// Watch the display state; the receiver sees every change.
    pub fn subscribe_display(&self) -> watch::Receiver<DisplayState> {
        self.display.subscribe()
    }

    /// Snapshot of the current display state.
    pub fn display(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn identity(&self) -> Option<u32> {
        self.identity
    }

    /// Pick this session's identity and start connecting.
    ///
    /// Only the first call has an effect. The returned receiver carries the
    /// broker's events; hand each one to [`handle_event`](Self::handle_event).
    pub async fn select_identity(
        &mut self,
        id: u32,
    ) -> Result<mpsc::Receiver<BrokerEvent>, ExchangeError> {
        if let Some(current) = self.identity {
            return Err(ExchangeError::IdentityAlreadySelected(current));
        }

        info!(identity = id, "Identity selected");
        self.identity = Some(id);
        self.state = ConnectionState::Connecting;
        self.display.send_modify(|d| {
            d.status = ConnectionState::Connecting;
            d.identity = Some(id);
        });

        Ok(self.connect(id).await)
    }

    async fn connect(&mut self, id: u32) -> mpsc::Receiver<BrokerEvent> {
        let client_id = client_id(&self.config.client_id_prefix, id);
        let (link, events) = self.connector.connect(&client_id);

        // The request waits in the link until the broker accepts the session.
        if let Err(e) = link.subscribe(&self.config.topic).await {
            warn!(topic = %self.config.topic, error = %e, "Subscribe request failed");
            self.show_error(e.to_string());
        }

        self.link = Some(link);
        events
    }

    /// Send a fresh announcement under our identity.
    pub async fn publish(&self) -> Result<Announcement, ExchangeError> {
        let (Some(identity), ConnectionState::Connected) = (self.identity, self.state) else {
            return Err(ExchangeError::NotConnected);
        };
        let link = self.link.as_ref().ok_or(ExchangeError::NotConnected)?;

        let announcement = Announcement::random(identity);
        let payload = announcement
            .encode()
            .map_err(|e| ExchangeError::Encode(e.to_string()))?;

        link.publish(&self.config.topic, Bytes::from(payload)).await?;
        self.display
            .send_modify(|d| d.sent = Some(announcement.quoted()));

        info!(identity, value = announcement.value, "Announcement sent");
        Ok(announcement)
    }

    /// React to one event from the broker connection.
    pub async fn handle_event(&mut self, event: BrokerEvent) {
        match event {
            BrokerEvent::Connected => {
                info!(topic = %self.config.topic, "Connected");
                self.state = ConnectionState::Connected;
                self.display
                    .send_modify(|d| d.status = ConnectionState::Connected);
                if let Err(e) = self.publish().await {
                    warn!(error = %e, "Initial announcement failed");
                }
            }
            BrokerEvent::Subscribed { topic } => {
                debug!(topic = %topic, "Subscribed");
            }
            BrokerEvent::SubscribeFailed { topic, reason } => {
                warn!(topic = %topic, reason = %reason, "Subscription failed");
                self.show_error(reason);
            }
            BrokerEvent::Message { topic, payload } => {
                self.receive(&topic, &payload);
            }
            BrokerEvent::Disconnected => {
                warn!("Broker connection closed");
                self.show_error(ExchangeError::ConnectionClosed.to_string());
            }
            BrokerEvent::Error(message) => {
                warn!(error = %message, "Broker connection error");
                self.show_error(message);
            }
        }
    }

    /// Show an announcement unless it carries our own identity.
    ///
    /// Any other participant that picked the same identity is hidden too.
    fn receive(&self, topic: &str, payload: &[u8]) {
        let announcement = match Announcement::decode(payload) {
            Ok(a) => a,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Ignoring malformed announcement");
                return;
            }
        };

        if Some(announcement.id) == self.identity {
            debug!(identity = announcement.id, "Suppressed own announcement");
            return;
        }

        debug!(from = announcement.id, value = announcement.value, "Announcement received");
        self.display
            .send_modify(|d| d.received = Some(announcement.quoted()));
    }

    fn show_error(&self, message: String) {
        self.display.send_modify(|d| d.error = Some(message));
    }
}

/// `<prefix>-<identity>-<8 random hex chars>`, unique per connection.
fn client_id(prefix: &str, id: u32) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{id}-{}", &suffix[..8])
}
