//! Protocol packet types.
//!
//! This module defines the typed packets exchanged between a client and a
//! connection, independent of the transport carrying them. Encoding packets
//! to bytes or text belongs to the transports and is not handled here.
//!
//! # Packet Types
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `open` | Server → Client | Handshake with session parameters |
//! | `close` | Both | Request transport close |
//! | `ping` / `pong` | Both | Heartbeat and upgrade probe |
//! | `message` | Both | Application payload |
//! | `upgrade` | Client → Server | Confirms a transport upgrade |
//! | `noop` | Server → Client | Forces a polling cycle |
//! | `error` | Client → Server | Peer could not parse our traffic |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `packet` | Packet, type, payload and options |
//! | `handshake` | Payload of the `open` packet |

// ============================================================================
// Submodules
// ============================================================================

/// Packet, type, payload and options.
pub mod packet;

/// Payload of the `open` packet.
pub mod handshake;

// ============================================================================
// Re-exports
// ============================================================================

pub use handshake::Handshake;
pub use packet::{Packet, PacketData, PacketOptions, PacketType};
