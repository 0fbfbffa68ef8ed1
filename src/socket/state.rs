//! Lifecycle state shared between a socket handle and its event loop.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;

use crate::emitter::Emitter;
use crate::identifiers::SocketId;

use super::event::SocketEvent;
use super::outbound::OutboundBuffer;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle state of a socket or transport.
///
/// Moves forward only: `opening → open → (closing →) closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReadyState {
    /// Handshake in progress.
    Opening,
    /// Carrying traffic.
    Open,
    /// Graceful shutdown started.
    Closing,
    /// Terminal.
    Closed,
}

impl ReadyState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` once shutdown has begun.
    #[inline]
    #[must_use]
    pub const fn is_shutting_down(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SocketStatus
// ============================================================================

/// Observable flags of one connection.
#[derive(Debug, Clone)]
pub(crate) struct SocketStatus {
    pub ready_state: ReadyState,
    pub upgrading: bool,
    pub upgraded: bool,
    /// Name of the current transport.
    pub transport: String,
}

// ============================================================================
// Shared
// ============================================================================

/// State readable from any handle.
///
/// Only the event loop mutates it, and it never holds these locks while
/// calling out to handlers, transports, or completion callbacks.
pub(crate) struct Shared {
    pub id: SocketId,
    pub status: Mutex<SocketStatus>,
    pub outbound: Mutex<OutboundBuffer>,
    pub events: Emitter<SocketEvent>,
}

impl Shared {
    pub(crate) fn new(id: SocketId, transport: &str) -> Self {
        Self {
            id,
            status: Mutex::new(SocketStatus {
                ready_state: ReadyState::Opening,
                upgrading: false,
                upgraded: false,
                transport: transport.to_string(),
            }),
            outbound: Mutex::new(OutboundBuffer::new()),
            events: Emitter::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_order() {
        assert!(ReadyState::Opening < ReadyState::Open);
        assert!(ReadyState::Open < ReadyState::Closing);
        assert!(ReadyState::Closing < ReadyState::Closed);
    }

    #[test]
    fn test_shutting_down() {
        assert!(!ReadyState::Open.is_shutting_down());
        assert!(ReadyState::Closing.is_shutting_down());
        assert!(ReadyState::Closed.is_shutting_down());
        assert_eq!(ReadyState::Closing.to_string(), "closing");
    }

    #[test]
    fn test_shared_starts_opening() {
        let shared = Shared::new(SocketId::from("s"), "polling");
        let status = shared.status.lock();
        assert_eq!(status.ready_state, ReadyState::Opening);
        assert!(!status.upgrading);
        assert!(!status.upgraded);
        assert_eq!(status.transport, "polling");
    }
}
