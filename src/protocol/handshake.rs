//! Payload of the `open` packet.
//!
//! # Format
//!
//! ```json
//! {
//!   "sid": "4e9c0a6f2b1d4c8e9f3a7b5d1c2e8f60",
//!   "upgrades": ["websocket"],
//!   "pingInterval": 25000,
//!   "pingTimeout": 5000
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::SocketId;

use super::{Packet, PacketType};

// ============================================================================
// Handshake
// ============================================================================

/// Session parameters announced to the client when a connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Connection identifier.
    pub sid: SocketId,
    /// Transports the client may upgrade to, best first.
    pub upgrades: Vec<String>,
    /// Expected client ping period in milliseconds.
    pub ping_interval: u64,
    /// Grace period after a missed ping in milliseconds.
    pub ping_timeout: u64,
}

impl Handshake {
    /// Creates a handshake payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a duration does not fit in `u64`
    /// milliseconds.
    pub fn new(
        sid: SocketId,
        upgrades: Vec<String>,
        ping_interval: Duration,
        ping_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            sid,
            upgrades,
            ping_interval: millis("ping_interval", ping_interval)?,
            ping_timeout: millis("ping_timeout", ping_timeout)?,
        })
    }

    /// Builds the `open` packet carrying this payload as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_packet(&self) -> Result<Packet> {
        let json = serde_json::to_string(self)?;
        Ok(Packet::new(PacketType::Open, Some(json.into())))
    }
}

/// Converts `value` to whole milliseconds for the wire.
pub(crate) fn millis(name: &str, value: Duration) -> Result<u64> {
    u64::try_from(value.as_millis())
        .map_err(|_| Error::config(format!("{name} does not fit in u64 milliseconds")))
}

// ============================================================================
// Tests
// ============================================================================
