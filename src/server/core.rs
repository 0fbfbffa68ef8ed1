//! Server registry.
//!
//! # Example
//!
//! ```ignore
//! use engine_socket::{Server, ServerOptions, ServerEventKind, ServerEvent};
//!
//! let server = Server::new(ServerOptions::default())?;
//!
//! server.on(ServerEventKind::Connection, |event| {
//!     if let ServerEvent::Connection(socket) = event {
//!         let _ = socket.send("welcome");
//!     }
//! });
//!
//! // Called by the HTTP layer for a request without a session id.
//! let socket = server.handshake(polling_transport)?;
//!
//! // Called by the HTTP layer for a websocket request carrying `sid`.
//! server.handle_upgrade(socket.id(), websocket_transport)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::emitter::Emitter;
use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, SocketId};
use crate::protocol::Packet;
use crate::socket::{Socket, SocketEventKind, SocketOwner};
use crate::transport::{self, Transport};

use super::event::{ServerEvent, ServerEventKind};
use super::options::ServerOptions;

// ============================================================================
// Server
// ============================================================================

/// Accepts connections and tracks the live ones.
///
/// Thread-safe; share it as `Arc<Server>`.
pub struct Server {
    options: ServerOptions,
    clients: RwLock<FxHashMap<SocketId, Socket>>,
    events: Emitter<ServerEvent>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("options", &self.options)
            .field("clients", &self.client_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Server - Constructor
// ============================================================================

impl Server {
    /// Creates a server with validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `options` fail validation.
    pub fn new(options: ServerOptions) -> Result<Arc<Self>> {
        options.validate()?;

        debug!(
            transports = ?options.transports,
            ping_interval = ?options.ping_interval,
            ping_timeout = ?options.ping_timeout,
            "Server created"
        );

        Ok(Arc::new(Self {
            options,
            clients: RwLock::new(FxHashMap::default()),
            events: Emitter::new(),
        }))
    }

    /// Server configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }
}

// ============================================================================
// Server - Connections
// ============================================================================

impl Server {
    /// Opens a new connection on `transport`.
    ///
    /// The socket is registered before its open sequence runs and stays
    /// registered until its `close` notification fires.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTransport`] if the transport is not enabled
    /// - [`Error::Config`] if the configured timings do not fit the handshake
    /// - [`Error::Json`] if the handshake cannot be serialized
    pub fn handshake(self: &Arc<Self>, transport: Arc<dyn Transport>) -> Result<Socket> {
        if !self.options.is_enabled(transport.name()) {
            debug!(transport = transport.name(), "Handshake on disabled transport");
            return Err(Error::unknown_transport(transport.name()));
        }

        let id = SocketId::generate();
        let owner: Arc<dyn SocketOwner> = Arc::clone(self) as Arc<dyn SocketOwner>;
        let registry = Arc::downgrade(self);
        let opened = Socket::open(id.clone(), owner, transport, |socket| {
            self.clients.write().insert(id.clone(), socket.clone());

            let closed_id = id.clone();
            socket.once(SocketEventKind::Close, move |_| {
                if let Some(server) = registry.upgrade() {
                    server.remove(&closed_id);
                }
            });
        });
        let socket = match opened {
            Ok(socket) => socket,
            Err(err) => {
                self.remove(&id);
                return Err(err);
            }
        };

        debug!(socket = %id, transport = %socket.transport_name(), "Connection accepted");
        self.events.emit(&ServerEvent::Connection(socket.clone()));

        Ok(socket)
    }

    /// Offers `transport` as the next transport of connection `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownSocket`] if no live connection has this id
    /// - [`Error::UpgradeRejected`] if the transport is not a valid upgrade
    ///   of the connection's current transport; it is closed
    /// - [`Error::SocketClosed`] if the connection's loop already ended
    pub fn handle_upgrade(&self, id: &SocketId, transport: Arc<dyn Transport>) -> Result<()> {
        let socket = self
            .client(id)
            .ok_or_else(|| Error::unknown_socket(id.clone()))?;

        let from = socket.transport_name();
        if !self.upgrades(&from).iter().any(|t| t == transport.name()) {
            warn!(socket = %id, from = %from, to = transport.name(), "Invalid upgrade request");
            let to = transport.name().to_string();
            transport.close(None);
            return Err(Error::upgrade_rejected(from, to));
        }

        socket.maybe_upgrade(transport)
    }

    /// Transports a connection on `from` may move to, best first.
    #[must_use]
    pub fn upgrades(&self, from: &str) -> Vec<String> {
        if !self.options.allow_upgrades {
            return Vec::new();
        }
        transport::upgrades_to(from)
            .iter()
            .filter(|name| self.options.is_enabled(name))
            .map(|name| (*name).to_string())
            .collect()
    }

    /// Looks up a live connection.
    #[must_use]
    pub fn client(&self, id: &SocketId) -> Option<Socket> {
        self.clients.read().get(id).cloned()
    }

    /// Number of live connections.
    #[inline]
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Identifiers of live connections.
    #[must_use]
    pub fn client_ids(&self) -> Vec<SocketId> {
        self.clients.read().keys().cloned().collect()
    }

    /// Closes every connection, discarding pending writes.
    pub fn close(&self) {
        let sockets: Vec<Socket> = self.clients.read().values().cloned().collect();
        debug!(clients = sockets.len(), "Closing all connections");

        for socket in sockets {
            if socket.close_with(true).is_err() {
                trace!(socket = %socket.id(), "Connection already gone");
            }
        }
    }

    fn remove(&self, id: &SocketId) {
        if self.clients.write().remove(id).is_some() {
            debug!(socket = %id, "Connection removed");
        }
    }
}

// ============================================================================
// Server - Events
// ============================================================================

impl Server {
    /// Registers a durable notification handler.
    pub fn on<F>(&self, kind: ServerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler)
    }

    /// Registers a handler for the next `kind` notification only.
    pub fn once<F>(&self, kind: ServerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.events.once(kind, handler)
    }

    /// Removes a handler.
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }
}

// ============================================================================
// SocketOwner
// ============================================================================

impl SocketOwner for Server {
    fn options(&self) -> &ServerOptions {
        &self.options
    }

    fn upgrades(&self, from: &str) -> Vec<String> {
        Server::upgrades(self, from)
    }

    fn socket_flushed(&self, id: &SocketId, batch: &[Packet]) {
        self.events.emit(&ServerEvent::Flush {
            socket: id.clone(),
            packets: batch.to_vec(),
        });
    }

    fn socket_drained(&self, id: &SocketId) {
        self.events.emit(&ServerEvent::Drain { socket: id.clone() });
    }
}

// ============================================================================
// Tests
// ============================================================================
