//! Capability a socket needs from whoever accepted it.

use crate::identifiers::SocketId;
use crate::protocol::Packet;
use crate::server::ServerOptions;

/// The server side that owns a socket.
///
/// Supplies timing configuration and upgrade policy, and observes flushes
/// for metrics. [`Server`](crate::Server) is the standard implementation.
pub trait SocketOwner: Send + Sync + 'static {
    /// Timing and transport configuration.
    fn options(&self) -> &ServerOptions;

    /// Transports a socket on `from` may upgrade to, best first.
    fn upgrades(&self, from: &str) -> Vec<String>;

    /// A socket handed `batch` to its transport.
    fn socket_flushed(&self, _id: &SocketId, _batch: &[Packet]) {}

    /// A socket finished handing a batch to its transport.
    fn socket_drained(&self, _id: &SocketId) {}
}
