//! Server-level notifications.

use crate::emitter::Topic;
use crate::identifiers::SocketId;
use crate::protocol::Packet;
use crate::socket::Socket;

/// Notification raised by a [`Server`](super::Server).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A handshake produced a new connection.
    Connection(Socket),
    /// A connection handed a batch to its transport.
    Flush {
        /// Connection that flushed.
        socket: SocketId,
        /// The batch, in send order.
        packets: Vec<Packet>,
    },
    /// A connection finished handing a batch to its transport.
    Drain {
        /// Connection that drained.
        socket: SocketId,
    },
}

/// Topic of a [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventKind {
    /// [`ServerEvent::Connection`].
    Connection,
    /// [`ServerEvent::Flush`].
    Flush,
    /// [`ServerEvent::Drain`].
    Drain,
}

impl Topic for ServerEvent {
    type Kind = ServerEventKind;

    fn kind(&self) -> ServerEventKind {
        match self {
            Self::Connection(_) => ServerEventKind::Connection,
            Self::Flush { .. } => ServerEventKind::Flush,
            Self::Drain { .. } => ServerEventKind::Drain,
        }
    }
}
