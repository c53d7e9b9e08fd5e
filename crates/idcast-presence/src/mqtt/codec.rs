//! Fixed header, remaining-length and body encoding.
//!
//! Frame layout:
//! - Byte 0: packet type (high nibble) + flags (low nibble)
//! - Bytes 1..=4: remaining length, 7 bits per byte, high bit = continuation
//! - Body: variable header + payload, `remaining length` bytes

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::packet::{
    ConnAck, Connect, ConnectReturnCode, Packet, Publish, QoS, SubAck, Subscribe,
};

/// Largest value the 4-byte remaining length can carry.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed remaining length")]
    MalformedLength,

    #[error("packet body too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("string too long: {0} bytes")]
    StringTooLong(usize),

    #[error("packet truncated")]
    Truncated,

    #[error("invalid utf-8 string")]
    InvalidUtf8,

    #[error("invalid qos {0}")]
    InvalidQoS(u8),

    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("cannot encode packet type {0}")]
    Unsupported(u8),
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl Packet {
    /// Append the wire form of this packet to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let mut body = BytesMut::new();
        let flags = match self {
            Packet::Connect(connect) => {
                put_string(&mut body, PROTOCOL_NAME)?;
                body.put_u8(PROTOCOL_LEVEL);
                body.put_u8(if connect.clean_session { 0x02 } else { 0x00 });
                body.put_u16(connect.keep_alive);
                put_string(&mut body, &connect.client_id)?;
                0
            }
            Packet::ConnAck(ack) => {
                body.put_u8(u8::from(ack.session_present));
                body.put_u8(ack.code.to_byte());
                0
            }
            Packet::Publish(publish) => {
                put_string(&mut body, &publish.topic)?;
                if publish.qos != QoS::AtMostOnce {
                    body.put_u16(publish.packet_id.unwrap_or(1));
                }
                body.put_slice(&publish.payload);
                (u8::from(publish.dup) << 3) | ((publish.qos as u8) << 1) | u8::from(publish.retain)
            }
            Packet::Subscribe(subscribe) => {
                body.put_u16(subscribe.packet_id);
                put_string(&mut body, &subscribe.topic)?;
                body.put_u8(subscribe.qos as u8);
                0b0010
            }
            Packet::SubAck(ack) => {
                body.put_u16(ack.packet_id);
                body.put_slice(&ack.return_codes);
                0
            }
            Packet::PingReq | Packet::PingResp | Packet::Disconnect => 0,
            Packet::Other { kind } => return Err(CodecError::Unsupported(*kind)),
        };

        if body.len() > MAX_REMAINING_LENGTH {
            return Err(CodecError::PayloadTooLarge(body.len()));
        }

        buf.reserve(body.len() + 5);
        buf.put_u8((self.kind() << 4) | flags);
        put_remaining_length(buf, body.len());
        buf.put_slice(&body);
        Ok(())
    }
}

fn put_remaining_length(buf: &mut BytesMut, mut len: usize) {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if len == 0 {
            break;
        }
    }
}

fn put_string(buf: &mut BytesMut, s: &str) -> Result<(), CodecError> {
    let len = u16::try_from(s.len()).map_err(|_| CodecError::StringTooLong(s.len()))?;
    buf.put_u16(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one packet from the front of `buf`.
///
/// Returns `Ok(None)` and leaves `buf` untouched while the packet is still
/// incomplete. On success exactly one packet's bytes are consumed.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Packet>, CodecError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let mut remaining = 0usize;
    let mut multiplier = 1usize;
    let mut header_len = 0usize;
    for i in 0..4 {
        let Some(&byte) = buf.get(1 + i) else {
            return Ok(None);
        };
        remaining += usize::from(byte & 0x7F) * multiplier;
        if byte & 0x80 == 0 {
            header_len = 2 + i;
            break;
        }
        multiplier *= 128;
    }
    if header_len == 0 {
        return Err(CodecError::MalformedLength);
    }

    if buf.len() < header_len + remaining {
        return Ok(None);
    }

    let first = buf[0];
    buf.advance(header_len);
    let body = buf.split_to(remaining).freeze();
    decode_body(first >> 4, first & 0x0F, body).map(Some)
}

fn decode_body(kind: u8, flags: u8, mut body: Bytes) -> Result<Packet, CodecError> {
    let packet = match kind {
        1 => {
            let protocol = get_string(&mut body)?;
            let level = get_u8(&mut body)?;
            if protocol != PROTOCOL_NAME || level != PROTOCOL_LEVEL {
                return Err(CodecError::InvalidProtocol(format!("{protocol} level {level}")));
            }
            let connect_flags = get_u8(&mut body)?;
            let keep_alive = get_u16(&mut body)?;
            let client_id = get_string(&mut body)?;
            Packet::Connect(Connect {
                client_id,
                keep_alive,
                clean_session: connect_flags & 0x02 != 0,
            })
        }
        2 => {
            let ack_flags = get_u8(&mut body)?;
            let code = get_u8(&mut body)?;
            Packet::ConnAck(ConnAck {
                session_present: ack_flags & 0x01 != 0,
                code: ConnectReturnCode::from_byte(code),
            })
        }
        3 => {
            let qos_bits = (flags >> 1) & 0x03;
            let qos = QoS::from_bits(qos_bits).ok_or(CodecError::InvalidQoS(qos_bits))?;
            let topic = get_string(&mut body)?;
            let packet_id = match qos {
                QoS::AtMostOnce => None,
                _ => Some(get_u16(&mut body)?),
            };
            Packet::Publish(Publish {
                topic,
                qos,
                packet_id,
                retain: flags & 0x01 != 0,
                dup: flags & 0x08 != 0,
                payload: body,
            })
        }
        8 => {
            let packet_id = get_u16(&mut body)?;
            let topic = get_string(&mut body)?;
            let qos_bits = get_u8(&mut body)? & 0x03;
            let qos = QoS::from_bits(qos_bits).ok_or(CodecError::InvalidQoS(qos_bits))?;
            Packet::Subscribe(Subscribe {
                packet_id,
                topic,
                qos,
            })
        }
        9 => {
            let packet_id = get_u16(&mut body)?;
            Packet::SubAck(SubAck {
                packet_id,
                return_codes: body.to_vec(),
            })
        }
        12 => Packet::PingReq,
        13 => Packet::PingResp,
        14 => Packet::Disconnect,
        other => Packet::Other { kind: other },
    };
    Ok(packet)
}

fn get_u8(body: &mut Bytes) -> Result<u8, CodecError> {
    if body.remaining() < 1 {
        return Err(CodecError::Truncated);
    }
    Ok(body.get_u8())
}

fn get_u16(body: &mut Bytes) -> Result<u16, CodecError> {
    if body.remaining() < 2 {
        return Err(CodecError::Truncated);
    }
    Ok(body.get_u16())
}

fn get_string(body: &mut Bytes) -> Result<String, CodecError> {
    let len = usize::from(get_u16(body)?);
    if body.remaining() < len {
        return Err(CodecError::Truncated);
    }
    let raw = body.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::SUBACK_FAILURE;

    fn encoded(packet: &Packet) -> Vec<u8> {
        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn encodes_connect() {
        let packet = Packet::Connect(Connect {
            client_id: "a".into(),
            keep_alive: 60,
            clean_session: true,
        });
        assert_eq!(
            encoded(&packet),
            vec![
                0x10, 0x0D, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x3C, 0x00,
                0x01, b'a'
            ]
        );
    }

    #[test]
    fn encodes_qos0_publish() {
        let packet = Packet::Publish(Publish::at_most_once("t", &b"hi"[..]));
        assert_eq!(
            encoded(&packet),
            vec![0x30, 0x05, 0x00, 0x01, b't', b'h', b'i']
        );
    }

    #[test]
    fn encodes_subscribe_with_reserved_flags() {
        let packet = Packet::Subscribe(Subscribe {
            packet_id: 1,
            topic: "t".into(),
            qos: QoS::AtMostOnce,
        });
        assert_eq!(
            encoded(&packet),
            vec![0x82, 0x06, 0x00, 0x01, 0x00, 0x01, b't', 0x00]
        );
    }

    #[test]
    fn encodes_empty_packets() {
        assert_eq!(encoded(&Packet::PingReq), vec![0xC0, 0x00]);
        assert_eq!(encoded(&Packet::PingResp), vec![0xD0, 0x00]);
        assert_eq!(encoded(&Packet::Disconnect), vec![0xE0, 0x00]);
    }

    #[test]
    fn refuses_to_encode_unknown_packet() {
        let mut buf = BytesMut::new();
        let err = Packet::Other { kind: 4 }.encode(&mut buf).unwrap_err();
        assert_eq!(err, CodecError::Unsupported(4));
        assert!(buf.is_empty());
    }

    #[test]
    fn multi_byte_remaining_length() {
        let payload = vec![0xAB; 200];
        let bytes = encoded(&Packet::Publish(Publish::at_most_once("t", payload.clone())));
        assert_eq!(&bytes[..3], &[0x30, 0xCB, 0x01]);
        assert_eq!(bytes.len(), 3 + 203);

        let mut buf = BytesMut::from(&bytes[..]);
        match decode(&mut buf).unwrap() {
            Some(Packet::Publish(p)) => {
                assert_eq!(p.topic, "t");
                assert_eq!(&p.payload[..], &payload[..]);
            }
            other => panic!("expected publish, got {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_accepted_connack() {
        let mut buf = BytesMut::from(&[0x20, 0x02, 0x00, 0x00][..]);
        let packet = decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            packet,
            Packet::ConnAck(ConnAck {
                session_present: false,
                code: ConnectReturnCode::Accepted,
            })
        );
    }

    #[test]
    fn decodes_refused_connack() {
        let mut buf = BytesMut::from(&[0x20, 0x02, 0x01, 0x05][..]);
        let Some(Packet::ConnAck(ack)) = decode(&mut buf).unwrap() else {
            panic!("expected connack");
        };
        assert!(ack.session_present);
        assert_eq!(ack.code, ConnectReturnCode::NotAuthorized);
        assert_eq!(ack.code.to_string(), "not authorized");
    }

    #[test]
    fn decodes_suback_failure() {
        let mut buf = BytesMut::from(&[0x90, 0x03, 0x00, 0x07, SUBACK_FAILURE][..]);
        let packet = decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            packet,
            Packet::SubAck(SubAck {
                packet_id: 7,
                return_codes: vec![SUBACK_FAILURE],
            })
        );
    }

    #[test]
    fn decodes_qos1_publish_with_packet_id() {
        // flags: dup=0, qos=1, retain=1
        let mut buf = BytesMut::from(&[0x33, 0x06, 0x00, 0x01, b't', 0x00, 0x2A, b'x'][..]);
        let Some(Packet::Publish(p)) = decode(&mut buf).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(p.qos, QoS::AtLeastOnce);
        assert_eq!(p.packet_id, Some(42));
        assert!(p.retain);
        assert_eq!(&p.payload[..], b"x");
    }

    #[test]
    fn partial_buffer_waits_for_more_bytes() {
        let bytes = encoded(&Packet::Publish(Publish::at_most_once("topic", &b"payload"[..])));
        let mut buf = BytesMut::new();
        for (i, byte) in bytes.iter().enumerate() {
            buf.put_u8(*byte);
            let result = decode(&mut buf).unwrap();
            if i + 1 < bytes.len() {
                assert!(result.is_none());
                assert_eq!(buf.len(), i + 1);
            } else {
                assert!(matches!(result, Some(Packet::Publish(_))));
            }
        }
    }

    #[test]
    fn decodes_back_to_back_packets() {
        let mut buf = BytesMut::new();
        Packet::PingResp.encode(&mut buf).unwrap();
        Packet::Publish(Publish::at_most_once("t", &b"1"[..]))
            .encode(&mut buf)
            .unwrap();

        assert_eq!(decode(&mut buf).unwrap(), Some(Packet::PingResp));
        assert!(matches!(decode(&mut buf).unwrap(), Some(Packet::Publish(_))));
        assert_eq!(decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn unknown_packet_is_consumed() {
        // PUBACK for packet id 1, then a PINGRESP.
        let mut buf = BytesMut::from(&[0x40, 0x02, 0x00, 0x01, 0xD0, 0x00][..]);
        assert_eq!(decode(&mut buf).unwrap(), Some(Packet::Other { kind: 4 }));
        assert_eq!(decode(&mut buf).unwrap(), Some(Packet::PingResp));
    }

    #[test]
    fn rejects_five_byte_remaining_length() {
        let mut buf = BytesMut::from(&[0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01][..]);
        assert_eq!(decode(&mut buf), Err(CodecError::MalformedLength));
    }

    #[test]
    fn rejects_truncated_body() {
        // Remaining length says 2 but the topic length claims 5 bytes.
        let mut buf = BytesMut::from(&[0x30, 0x02, 0x00, 0x05][..]);
        assert_eq!(decode(&mut buf), Err(CodecError::Truncated));
    }

    #[test]
    fn decodes_connect_and_subscribe_sent_by_clients() {
        let mut buf = BytesMut::new();
        let connect = Packet::Connect(Connect {
            client_id: "idcast-1-deadbeef".into(),
            keep_alive: 30,
            clean_session: true,
        });
        let subscribe = Packet::Subscribe(Subscribe {
            packet_id: 9,
            topic: "room".into(),
            qos: QoS::AtMostOnce,
        });
        connect.encode(&mut buf).unwrap();
        subscribe.encode(&mut buf).unwrap();

        assert_eq!(decode(&mut buf).unwrap(), Some(connect));
        assert_eq!(decode(&mut buf).unwrap(), Some(subscribe));
    }
}
