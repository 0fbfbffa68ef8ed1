//! Transport capability contract.
//!
//! A connection never talks to the network itself. It drives whichever
//! [`Transport`] is currently bound to it and listens to that transport's
//! [`TransportEvent`] stream. Concrete transports (HTTP long-polling,
//! websocket framing) live outside this crate and implement the trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   send / close / discard    ┌─────────────────┐
//! │                 │ ──────────────────────────► │                 │
//! │     Socket      │                             │    Transport    │
//! │   (event loop)  │ ◄────────────────────────── │  (polling, ws)  │
//! └─────────────────┘  packet / drain / close /   └─────────────────┘
//!                      error via Emitter
//! ```
//!
//! # Contract
//!
//! - `send` hands over one batch; the transport emits `drain` once per
//!   completed unit (the whole batch without framing, each packet with it).
//! - `close` is idempotent: once the transport is closing or closed, further
//!   calls do nothing and their callbacks are dropped.
//! - `discard` makes pending writes and late errors inert.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::emitter::{Emitter, Topic};
use crate::protocol::Packet;
use crate::socket::ReadyState;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory transport for tests.
#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Constants
// ============================================================================

/// Name of the HTTP long-polling transport.
pub const POLLING: &str = "polling";

/// Name of the websocket transport.
pub const WEBSOCKET: &str = "websocket";

// ============================================================================
// Types
// ============================================================================

/// Callback invoked once a transport finished closing.
pub type CloseCallback = Box<dyn FnOnce() + Send>;

// ============================================================================
// TransportEvent
// ============================================================================

/// Notification raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A decoded inbound packet.
    Packet(Packet),
    /// A previously sent unit was written.
    Drain,
    /// The underlying channel closed.
    Close,
    /// An I/O failure, with a description.
    Error(String),
}

/// Topic of a [`TransportEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEventKind {
    /// [`TransportEvent::Packet`].
    Packet,
    /// [`TransportEvent::Drain`].
    Drain,
    /// [`TransportEvent::Close`].
    Close,
    /// [`TransportEvent::Error`].
    Error,
}

impl Topic for TransportEvent {
    type Kind = TransportEventKind;

    fn kind(&self) -> TransportEventKind {
        match self {
            Self::Packet(_) => TransportEventKind::Packet,
            Self::Drain => TransportEventKind::Drain,
            Self::Close => TransportEventKind::Close,
            Self::Error(_) => TransportEventKind::Error,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A pluggable bidirectional channel carrying packets for one connection.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Transport name, e.g. [`POLLING`] or [`WEBSOCKET`].
    fn name(&self) -> &str;

    /// Returns `true` if a batch can be handed over right now.
    fn is_writable(&self) -> bool;

    /// Returns `true` if the transport reports completion per packet.
    fn supports_framing(&self) -> bool;

    /// Current lifecycle state of the transport.
    fn ready_state(&self) -> ReadyState;

    /// Hands a batch of packets over for transmission.
    fn send(&self, packets: Vec<Packet>);

    /// Closes the transport, calling `on_complete` once it is closed.
    fn close(&self, on_complete: Option<CloseCallback>);

    /// Marks the transport superseded: pending writes and errors become inert.
    fn discard(&self);

    /// Notification stream of this transport.
    fn events(&self) -> &Emitter<TransportEvent>;

    /// Returns `true` for the long-polling transport.
    #[inline]
    fn is_polling(&self) -> bool {
        self.name() == POLLING
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Transports a connection on `name` may upgrade to, best first.
#[must_use]
pub fn upgrades_to(name: &str) -> &'static [&'static str] {
    match name {
        POLLING => &[WEBSOCKET],
        _ => &[],
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_table() {
        assert_eq!(upgrades_to(POLLING), &[WEBSOCKET]);
        assert!(upgrades_to(WEBSOCKET).is_empty());
        assert!(upgrades_to("carrier-pigeon").is_empty());
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(TransportEvent::Drain.kind(), TransportEventKind::Drain);
        assert_eq!(
            TransportEvent::Packet(Packet::noop()).kind(),
            TransportEventKind::Packet
        );
        assert_eq!(
            TransportEvent::Error("boom".into()).kind(),
            TransportEventKind::Error
        );
    }
}
