pub mod broker;
pub mod exchanger;
pub mod mqtt;
pub mod protocol;

pub use broker::{BrokerClient, BrokerConfig, BrokerEvent};
pub use exchanger::{
    BrokerConnector, ConnectionState, Connector, DisplayState, ExchangerConfig, Link,
    PresenceExchanger,
};
pub use protocol::Announcement;
