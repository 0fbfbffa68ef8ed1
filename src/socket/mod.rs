//! Connection state machine.
//!
//! A [`Socket`] is one logical client connection. It stays the same object
//! while the transport underneath it changes, and it owns:
//!
//! - The lifecycle (`opening → open → closing → closed`)
//! - The heartbeat deadline
//! - The ordered outbound buffer and send-completion sequencing
//! - The probe/confirm upgrade handshake
//!
//! # Event Loop
//!
//! Each socket spawns one tokio task that owns all of its mutable state.
//! Handles post commands into its mailbox; transports and timers post
//! notifications into the same mailbox, so everything happens on one
//! timeline in arrival order.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handle` | Public [`Socket`] handle |
//! | `core` | Event loop, lifecycle, inbound and outbound paths |
//! | `upgrade` | Probe/confirm handshake |
//! | `outbound` | Ordered buffer and callback sequencing |
//! | `binding` | Attachment to the current transport |
//! | `liveness` | Heartbeat deadline |
//! | `timer` | Cancellable timer slots |

// ============================================================================
// Submodules
// ============================================================================

mod binding;
mod command;
mod core;
mod event;
mod handle;
mod liveness;
mod outbound;
mod owner;
mod state;
mod timer;
mod upgrade;


// ============================================================================
// Re-exports
// ============================================================================

pub use event::{SocketEvent, SocketEventKind};
pub use handle::Socket;
pub use outbound::SendCallback;
pub use owner::SocketOwner;
pub use state::ReadyState;
