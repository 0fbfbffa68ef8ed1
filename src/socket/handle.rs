//! Public handle to a connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, SocketId};
use crate::protocol::{Packet, PacketData, PacketOptions, PacketType};
use crate::transport::Transport;

use super::command::{Command, Mailbox};
use super::core::SocketCore;
use super::event::{SocketEvent, SocketEventKind};
use super::outbound::SendCallback;
use super::owner::SocketOwner;
use super::state::{ReadyState, Shared};

// ============================================================================
// Socket
// ============================================================================

/// One logical client connection, independent of its current transport.
///
/// Cheap to clone; every clone drives the same connection. Mutating calls
/// are queued to the connection's event loop and return immediately.
///
/// # Example
///
/// ```ignore
/// let socket = server.handshake(transport)?;
///
/// socket.on(SocketEventKind::Message, |event| {
///     if let SocketEvent::Message(data) = event {
///         println!("received {data:?}");
///     }
/// });
///
/// socket.send("hello")?;
/// ```
#[derive(Clone)]
pub struct Socket {
    shared: Arc<Shared>,
    mailbox: Mailbox,
}

// ============================================================================
// Socket - Constructor
// ============================================================================

impl Socket {
    /// Opens a connection on `transport` and spawns its event loop.
    ///
    /// The `open` packet is queued, the socket becomes `open`, and the
    /// heartbeat starts before this returns. Must be called from within a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the owner's timings do not fit the
    /// handshake, or [`Error::Json`] if it cannot be serialized.
    pub fn new(
        id: SocketId,
        owner: Arc<dyn SocketOwner>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::open(id, owner, transport, |_| {})
    }

    /// Like [`Socket::new`], but runs `setup` on the handle before the open
    /// sequence.
    ///
    /// Handlers registered in `setup` observe the socket's first events,
    /// including [`SocketEvent::Open`]. Commands posted from `setup` are
    /// processed once the socket is open. If opening fails, every handle
    /// created in `setup` reports [`Error::SocketClosed`].
    ///
    /// # Errors
    ///
    /// Same as [`Socket::new`].
    pub fn open<F>(
        id: SocketId,
        owner: Arc<dyn SocketOwner>,
        transport: Arc<dyn Transport>,
        setup: F,
    ) -> Result<Self>
    where
        F: FnOnce(&Socket),
    {
        let shared = Arc::new(Shared::new(id, transport.name()));
        let (mailbox, commands) = mpsc::unbounded_channel();
        let socket = Self {
            shared: Arc::clone(&shared),
            mailbox: mailbox.clone(),
        };
        setup(&socket);

        let core = SocketCore::open(shared, owner, transport, mailbox)?;
        tokio::spawn(core.run(commands));

        Ok(socket)
    }
}

// ============================================================================
// Socket - State
// ============================================================================

impl Socket {
    /// Connection identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SocketId {
        &self.shared.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.shared.status.lock().ready_state
    }

    /// Returns `true` while an upgrade handshake is in flight.
    #[must_use]
    pub fn is_upgrading(&self) -> bool {
        self.shared.status.lock().upgrading
    }

    /// Returns `true` once the connection moved to a new transport.
    #[must_use]
    pub fn is_upgraded(&self) -> bool {
        self.shared.status.lock().upgraded
    }

    /// Name of the transport currently carrying traffic.
    #[must_use]
    pub fn transport_name(&self) -> String {
        self.shared.status.lock().transport.clone()
    }

    /// Packets buffered but not yet handed to the transport.
    #[must_use]
    pub fn buffered_packets(&self) -> Vec<Packet> {
        self.shared.outbound.lock().packets()
    }

    /// Number of buffered packets.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.shared.outbound.lock().len()
    }
}

// ============================================================================
// Socket - Sending
// ============================================================================

impl Socket {
    /// Sends a `message` packet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn send(&self, data: impl Into<PacketData>) -> Result<()> {
        self.send_packet(PacketType::Message, Some(data.into()), None, None)
    }

    /// Sends a `message` packet with options and a completion callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn send_with<F>(
        &self,
        data: impl Into<PacketData>,
        options: Option<PacketOptions>,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send_packet(
            PacketType::Message,
            Some(data.into()),
            options,
            Some(Box::new(callback)),
        )
    }

    /// Queues a packet of any type.
    ///
    /// Ignored by the connection once it is closing or closed; `callback`
    /// is then dropped without running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn send_packet(
        &self,
        packet_type: PacketType,
        data: Option<PacketData>,
        options: Option<PacketOptions>,
        callback: Option<SendCallback>,
    ) -> Result<()> {
        self.post(Command::Send {
            packet_type,
            data,
            options,
            callback,
        })
    }
}

// ============================================================================
// Socket - Lifecycle
// ============================================================================

impl Socket {
    /// Closes the connection after flushing buffered packets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn close(&self) -> Result<()> {
        self.close_with(false)
    }

    /// Closes the connection; `discard` skips the graceful transport shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn close_with(&self, discard: bool) -> Result<()> {
        self.post(Command::Close { discard })
    }

    /// Offers `transport` as the connection's next transport.
    ///
    /// The connection probes it and switches once the client confirms. If
    /// the connection cannot upgrade right now the transport is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SocketClosed`] if the event loop has terminated.
    pub fn maybe_upgrade(&self, transport: Arc<dyn Transport>) -> Result<()> {
        self.post(Command::Upgrade(transport))
    }

    fn post(&self, command: Command) -> Result<()> {
        self.mailbox.send(command).map_err(|_| {
            trace!(socket = %self.shared.id, "Command after socket loop ended");
            Error::SocketClosed
        })
    }
}

// ============================================================================
// Socket - Events
// ============================================================================

impl Socket {
    /// Registers a durable notification handler.
    pub fn on<F>(&self, kind: SocketEventKind, handler: F) -> ListenerId
    where
        F: Fn(&SocketEvent) + Send + Sync + 'static,
    {
        self.shared.events.on(kind, handler)
    }

    /// Registers a handler for the next `kind` notification only.
    pub fn once<F>(&self, kind: SocketEventKind, handler: F) -> ListenerId
    where
        F: Fn(&SocketEvent) + Send + Sync + 'static,
    {
        self.shared.events.once(kind, handler)
    }

    /// Removes a handler.
    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.events.off(id)
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.shared.status.lock();
        f.debug_struct("Socket")
            .field("id", &self.shared.id)
            .field("ready_state", &status.ready_state)
            .field("transport", &status.transport)
            .field("upgraded", &status.upgraded)
            .finish()
    }
}
