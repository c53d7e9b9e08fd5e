//! Announcement payload exchanged between participants.
//!
//! Announcements travel as JSON text in the body of MQTT PUBLISH packets:
//! `{"id": 1, "message": 0.4211}`. There is no envelope, version or
//! sequence number.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One participant's identity and the random value it sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: u32,
    #[serde(rename = "message")]
    pub value: f64,
}

impl Announcement {
    pub fn new(id: u32, value: f64) -> Self {
        Self { id, value }
    }

    /// Announcement carrying a fresh value in `[0, 1)`.
    pub fn random(id: u32) -> Self {
        Self::new(id, rand::thread_rng().gen::<f64>())
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    /// Text shown in the sent/received display regions, quotes included.
    pub fn quoted(&self) -> String {
        format!("\"{self}\"")
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, number_text(self.value))
    }
}

/// Shortest round-trip text for `value` as a browser prints numbers:
/// positional, with exponent form below 1e-6 and from 1e21 up.
fn number_text(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&value.abs()) {
        return value.to_string();
    }
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_wire_field_names() {
        let json = Announcement::new(1, 0.5).encode().unwrap();
        assert_eq!(json, r#"{"id":1,"message":0.5}"#);
    }

    #[test]
    fn decodes_payload_from_another_participant() {
        let a = Announcement::decode(br#"{"id":2,"message":0.5}"#).unwrap();
        assert_eq!(a, Announcement::new(2, 0.5));
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let a = Announcement::decode(br#"{"id":3,"message":0.25,"color":"red"}"#).unwrap();
        assert_eq!(a.id, 3);
        assert_eq!(a.value, 0.25);
    }

    #[test]
    fn decode_rejects_malformed_payloads() {
        assert!(Announcement::decode(b"not json").is_err());
        assert!(Announcement::decode(br#"{"id":1}"#).is_err());
        assert!(Announcement::decode(br#"{"id":"one","message":0.1}"#).is_err());
        assert!(Announcement::decode(br#"{"id":-1,"message":0.1}"#).is_err());
    }

    #[test]
    fn round_trip_preserves_identity_and_value() {
        let original = Announcement::new(7, 0.123_456_789_012_345_67);
        let decoded = Announcement::decode(original.encode().unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.id, original.id);
        assert_eq!(decoded.value, original.value);
    }

    #[test]
    fn random_values_stay_in_unit_interval() {
        for _ in 0..1000 {
            let a = Announcement::random(1);
            assert!((0.0..1.0).contains(&a.value));
        }
    }

    #[test]
    fn quoted_matches_display_format() {
        assert_eq!(Announcement::new(2, 0.5).quoted(), "\"2: 0.5\"");
        assert_eq!(Announcement::new(1, 0.0).to_string(), "1: 0");
    }

    #[test]
    fn tiny_and_huge_values_use_exponent_form() {
        assert_eq!(Announcement::new(1, 0.000_001).to_string(), "1: 0.000001");
        assert_eq!(Announcement::new(1, 1e-7).to_string(), "1: 1e-7");
        assert_eq!(Announcement::new(1, 1.5e-7).quoted(), "\"1: 1.5e-7\"");
        assert_eq!(Announcement::new(2, -0.0).to_string(), "2: 0");
        assert_eq!(Announcement::new(2, 1e21).to_string(), "2: 1e+21");
        assert_eq!(Announcement::new(2, 123.25).to_string(), "2: 123.25");
    }
}
