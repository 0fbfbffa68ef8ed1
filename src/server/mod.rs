//! Connection registry and configuration.
//!
//! The [`Server`] accepts transports from an outer HTTP/websocket layer,
//! turns handshakes into [`Socket`](crate::Socket)s, routes upgrade
//! requests to the right connection, and forgets connections once they
//! close.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Server`] registry and [`SocketOwner`](crate::SocketOwner) impl |
//! | `event` | [`ServerEvent`] notifications |
//! | `options` | [`ServerOptions`] builder |

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod event;
mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Server;
pub use event::{ServerEvent, ServerEventKind};
pub use options::{
    DEFAULT_PING_INTERVAL, DEFAULT_PING_TIMEOUT, DEFAULT_UPGRADE_TIMEOUT, ServerOptions,
};
