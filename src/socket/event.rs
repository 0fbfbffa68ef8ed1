//! Notifications emitted by a socket.

use std::sync::Arc;

use crate::emitter::Topic;
use crate::error::CloseReason;
use crate::protocol::{Packet, PacketData};
use crate::transport::Transport;

// ============================================================================
// SocketEvent
// ============================================================================

/// Notification raised by a [`Socket`](super::Socket).
///
/// Handlers run on the socket's event loop, one at a time, in the order the
/// socket raised them.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// The handshake was queued and the socket is open.
    ///
    /// Emitted while the socket is being constructed, so only handlers
    /// registered in the setup of [`Socket::open`](super::Socket::open)
    /// receive it.
    Open,
    /// Any inbound packet, before type-specific handling.
    Packet(Packet),
    /// Payload of an inbound `message` packet.
    Data(PacketData),
    /// Payload of an inbound `message` packet.
    Message(PacketData),
    /// The client pinged; a `pong` was queued.
    Heartbeat,
    /// An outbound packet was built and buffered.
    PacketCreate(Packet),
    /// A batch is about to be handed to the transport.
    Flush(Vec<Packet>),
    /// A batch was handed to the transport.
    Drain,
    /// The upgrade candidate answered the probe.
    Upgrading(Arc<dyn Transport>),
    /// The socket now runs on this transport.
    Upgrade(Arc<dyn Transport>),
    /// The socket reached `closed`.
    Close {
        /// Why the socket closed.
        reason: CloseReason,
        /// Extra detail, e.g. the transport's error message.
        description: Option<String>,
    },
}

/// Topic of a [`SocketEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketEventKind {
    /// [`SocketEvent::Open`].
    Open,
    /// [`SocketEvent::Packet`].
    Packet,
    /// [`SocketEvent::Data`].
    Data,
    /// [`SocketEvent::Message`].
    Message,
    /// [`SocketEvent::Heartbeat`].
    Heartbeat,
    /// [`SocketEvent::PacketCreate`].
    PacketCreate,
    /// [`SocketEvent::Flush`].
    Flush,
    /// [`SocketEvent::Drain`].
    Drain,
    /// [`SocketEvent::Upgrading`].
    Upgrading,
    /// [`SocketEvent::Upgrade`].
    Upgrade,
    /// [`SocketEvent::Close`].
    Close,
}

impl Topic for SocketEvent {
    type Kind = SocketEventKind;

    fn kind(&self) -> SocketEventKind {
        match self {
            Self::Open => SocketEventKind::Open,
            Self::Packet(_) => SocketEventKind::Packet,
            Self::Data(_) => SocketEventKind::Data,
            Self::Message(_) => SocketEventKind::Message,
            Self::Heartbeat => SocketEventKind::Heartbeat,
            Self::PacketCreate(_) => SocketEventKind::PacketCreate,
            Self::Flush(_) => SocketEventKind::Flush,
            Self::Drain => SocketEventKind::Drain,
            Self::Upgrading(_) => SocketEventKind::Upgrading,
            Self::Upgrade(_) => SocketEventKind::Upgrade,
            Self::Close { .. } => SocketEventKind::Close,
        }
    }
}
