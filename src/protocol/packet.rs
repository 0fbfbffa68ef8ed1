//! Packet, type, payload and options.
//!
//! A [`Packet`] is immutable once built. Per-send options travel with the
//! packet so the transport can honour them when it encodes the batch.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// PacketType
// ============================================================================

/// Kind of a protocol packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketType {
    /// Handshake sent by the server when the connection opens.
    Open,
    /// Transport close request.
    Close,
    /// Heartbeat request (or upgrade probe when carrying `"probe"`).
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Application payload.
    Message,
    /// Upgrade confirmation from the client.
    Upgrade,
    /// Empty packet used to cycle a polling request.
    Noop,
    /// Parse failure reported by the peer.
    Error,
}

impl PacketType {
    /// Returns the protocol name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Message => "message",
            Self::Upgrade => "upgrade",
            Self::Noop => "noop",
            Self::Error => "error",
        }
    }

    /// Returns the single-digit wire code, if this type has one.
    ///
    /// `error` packets are produced by decoders and never encoded.
    #[must_use]
    pub const fn code(self) -> Option<u8> {
        match self {
            Self::Open => Some(0),
            Self::Close => Some(1),
            Self::Ping => Some(2),
            Self::Pong => Some(3),
            Self::Message => Some(4),
            Self::Upgrade => Some(5),
            Self::Noop => Some(6),
            Self::Error => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PacketData
// ============================================================================

/// Packet payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketData {
    /// UTF-8 text payload.
    Text(String),
    /// Binary payload.
    Binary(Vec<u8>),
}

impl PacketData {
    /// Returns the text payload, if this is text.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for PacketData {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PacketData {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for PacketData {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for PacketData {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

// ============================================================================
// PacketOptions
// ============================================================================

/// Per-packet send options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketOptions {
    /// Allow the transport to compress this packet.
    pub compress: bool,
}

impl Default for PacketOptions {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl PacketOptions {
    /// Options with compression disabled.
    #[inline]
    #[must_use]
    pub const fn uncompressed() -> Self {
        Self { compress: false }
    }

    /// Normalizes caller-supplied options.
    ///
    /// Compression stays on unless the caller explicitly turned it off.
    #[inline]
    #[must_use]
    pub fn normalize(options: Option<Self>) -> Self {
        options.unwrap_or_default()
    }
}

// ============================================================================
// Packet
// ============================================================================

/// A typed protocol packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: PacketType,
    data: Option<PacketData>,
    options: PacketOptions,
}

impl Packet {
    /// Payload carried by probe ping/pong packets.
    pub const PROBE: &'static str = "probe";

    /// Creates a packet with default options.
    #[inline]
    #[must_use]
    pub fn new(packet_type: PacketType, data: Option<PacketData>) -> Self {
        Self::with_options(packet_type, data, PacketOptions::default())
    }

    /// Creates a packet with explicit options.
    #[inline]
    #[must_use]
    pub fn with_options(
        packet_type: PacketType,
        data: Option<PacketData>,
        options: PacketOptions,
    ) -> Self {
        Self {
            packet_type,
            data,
            options,
        }
    }

    /// Creates a `message` packet.
    #[inline]
    #[must_use]
    pub fn message(data: impl Into<PacketData>) -> Self {
        Self::new(PacketType::Message, Some(data.into()))
    }

    /// Creates a `ping` packet.
    #[inline]
    #[must_use]
    pub fn ping(data: Option<PacketData>) -> Self {
        Self::new(PacketType::Ping, data)
    }

    /// Creates a `pong` packet.
    #[inline]
    #[must_use]
    pub fn pong(data: Option<PacketData>) -> Self {
        Self::new(PacketType::Pong, data)
    }

    /// Creates a probe `ping`.
    #[inline]
    #[must_use]
    pub fn probe_ping() -> Self {
        Self::ping(Some(Self::PROBE.into()))
    }

    /// Creates a probe `pong`.
    #[inline]
    #[must_use]
    pub fn probe_pong() -> Self {
        Self::pong(Some(Self::PROBE.into()))
    }

    /// Creates an `upgrade` packet.
    #[inline]
    #[must_use]
    pub fn upgrade() -> Self {
        Self::new(PacketType::Upgrade, None)
    }

    /// Creates a `noop` packet.
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self::new(PacketType::Noop, None)
    }

    /// Creates an `error` packet, as produced by a decoder on bad input.
    #[inline]
    #[must_use]
    pub fn error(description: impl Into<PacketData>) -> Self {
        Self::new(PacketType::Error, Some(description.into()))
    }

    /// Returns the packet type.
    #[inline]
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Returns the payload, if any.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&PacketData> {
        self.data.as_ref()
    }

    /// Returns the send options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> PacketOptions {
        self.options
    }

    /// Returns `true` for a `ping` carrying the probe payload.
    #[must_use]
    pub fn is_probe_ping(&self) -> bool {
        self.packet_type == PacketType::Ping
            && self.data.as_ref().and_then(PacketData::as_text) == Some(Self::PROBE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(PacketType::Open.code(), Some(0));
        assert_eq!(PacketType::Message.code(), Some(4));
        assert_eq!(PacketType::Noop.code(), Some(6));
        assert_eq!(PacketType::Error.code(), None);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let json = serde_json::to_string(&PacketType::Upgrade).unwrap();
        assert_eq!(json, "\"upgrade\"");
        assert_eq!(PacketType::Pong.to_string(), "pong");
    }

    #[test]
    fn test_options_normalization() {
        assert!(PacketOptions::normalize(None).compress);
        assert!(PacketOptions::normalize(Some(PacketOptions { compress: true })).compress);
        assert!(!PacketOptions::normalize(Some(PacketOptions::uncompressed())).compress);
    }

    #[test]
    fn test_probe_detection() {
        assert!(Packet::probe_ping().is_probe_ping());
        assert!(!Packet::ping(None).is_probe_ping());
        assert!(!Packet::ping(Some("other".into())).is_probe_ping());
        assert!(!Packet::probe_pong().is_probe_ping());
        assert!(!Packet::ping(Some(PacketData::Binary(b"probe".to_vec()))).is_probe_ping());
    }

    #[test]
    fn test_message_payload() {
        let packet = Packet::message("hi");
        assert_eq!(packet.packet_type(), PacketType::Message);
        assert_eq!(packet.data().and_then(PacketData::as_text), Some("hi"));
        assert!(packet.options().compress);
    }

    #[test]
    fn test_data_len() {
        assert_eq!(PacketData::from("abc").len(), 3);
        assert!(PacketData::from(Vec::new()).is_empty());
    }
}
