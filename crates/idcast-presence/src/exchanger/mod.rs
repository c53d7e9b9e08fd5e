//! Presence exchange session.
//!
//! One [`PresenceExchanger`] per running instance owns the chosen identity,
//! the broker link and the published [`DisplayState`]. It publishes an
//! announcement as soon as the broker accepts the session and shows
//! announcements from every other identity.

mod link;
mod session;
mod types;

pub use link::{BrokerConnector, Connector, Link};
pub use session::PresenceExchanger;
pub use types::{ConnectionState, DisplayState, ExchangerConfig};
