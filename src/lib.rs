//! Engine Socket - transport-agnostic real-time connection engine.
//!
//! This library implements the server side of an engine.io-style protocol:
//! one logical connection per client that survives a change of transport
//! underneath it.
//!
//! # Architecture
//!
//! The engine sits between an outer HTTP/websocket layer and the
//! application:
//!
//! - **Transports** (outside this crate): move packets over long-polling or
//!   websocket framing, implement [`Transport`]
//! - **Server**: accepts handshakes, allocates ids, routes upgrade requests
//! - **Socket**: lifecycle, heartbeat, ordered buffering, and upgrades
//!
//! Key design principles:
//!
//! - Each [`Socket`] owns one tokio event loop; all of its state changes
//!   happen there, in arrival order
//! - Upgrades follow a probe/confirm handshake and never lose or duplicate
//!   a buffered packet
//! - Notifications from a superseded transport are ignored
//!
//! # Quick Start
//!
//! ```ignore
//! use engine_socket::{Server, ServerOptions, SocketEvent, SocketEventKind, Result};
//!
//! fn accept(transport: std::sync::Arc<dyn engine_socket::Transport>) -> Result<()> {
//!     let server = Server::new(ServerOptions::default())?;
//!
//!     let socket = server.handshake(transport)?;
//!     socket.on(SocketEventKind::Message, |event| {
//!         if let SocketEvent::Message(data) = event {
//!             println!("received {data:?}");
//!         }
//!     });
//!     socket.send("hello")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`emitter`] | Topic-keyed notification primitive |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Packet model and handshake payload |
//! | [`server`] | Connection registry and [`ServerOptions`] |
//! | [`socket`] | Connection state machine |
//! | [`transport`] | Transport capability contract |

// ============================================================================
// Modules
// ============================================================================

/// Topic-keyed notification primitive.
///
/// Sockets, servers, and transports all raise their notifications through
/// an [`Emitter`].
pub mod emitter;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Packet model.
///
/// The byte/text codec lives with the transports.
pub mod protocol;

/// Connection registry.
///
/// Use [`Server::new`] to create a server, then hand it transports.
pub mod server;

/// Connection state machine.
pub mod socket;

/// Transport capability contract.
///
/// Implement [`Transport`] to plug a concrete channel into the engine.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Notification types
pub use emitter::{Disposers, Emitter, Topic};

// Error types
pub use error::{CloseReason, Error, Result};

// Identifier types
pub use identifiers::{ListenerId, SocketId};

// Protocol types
pub use protocol::{Handshake, Packet, PacketData, PacketOptions, PacketType};

// Server types
pub use server::{Server, ServerEvent, ServerEventKind, ServerOptions};

// Socket types
pub use socket::{ReadyState, SendCallback, Socket, SocketEvent, SocketEventKind, SocketOwner};

// Transport types
pub use transport::{CloseCallback, Transport, TransportEvent, TransportEventKind};
