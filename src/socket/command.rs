//! Messages processed by a socket's event loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::protocol::{PacketData, PacketOptions, PacketType};
use crate::transport::{Transport, TransportEvent};

use super::binding::BindingId;
use super::outbound::SendCallback;
use super::timer::TimerKind;

/// Sender side of a socket's event loop.
pub(crate) type Mailbox = mpsc::UnboundedSender<Command>;

/// Internal commands for the event loop.
pub(crate) enum Command {
    /// Queue an outbound packet.
    Send {
        packet_type: PacketType,
        data: Option<PacketData>,
        options: Option<PacketOptions>,
        callback: Option<SendCallback>,
    },
    /// Begin closing the socket.
    Close { discard: bool },
    /// A second transport wants to take over.
    Upgrade(Arc<dyn Transport>),
    /// Notification forwarded from a bound or candidate transport.
    Transport {
        binding: BindingId,
        event: TransportEvent,
    },
    /// A transport finished a close this socket requested.
    TransportClosed,
    /// A timer fired.
    Timer { kind: TimerKind, generation: u64 },
    /// Deferred drop of the outbound buffer after close.
    ClearBuffer,
}
