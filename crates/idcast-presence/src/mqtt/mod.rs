//! MQTT 3.1.1 control packets and their binary encoding.
//!
//! Only the packets a QoS 0 publish/subscribe client needs are modelled
//! in full. Anything else a broker sends is consumed whole and surfaced as
//! [`Packet::Other`] so the stream stays aligned.

mod codec;
mod packet;

pub use codec::{decode, CodecError, MAX_REMAINING_LENGTH};
pub use packet::{
    ConnAck, Connect, ConnectReturnCode, Packet, Publish, QoS, SubAck, Subscribe,
    SUBACK_FAILURE,
};
