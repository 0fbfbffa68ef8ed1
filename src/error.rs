//! Error types for the connection engine.
//!
//! This module defines the errors returned by the public API. Faults that
//! happen *inside* a connection (heartbeat expiry, transport failures,
//! malformed packets) never surface here: they end the connection and are
//! reported through the `close` notification with a [`CloseReason`].
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Handshake | [`Error::UnknownTransport`], [`Error::UnknownSocket`], [`Error::UpgradeRejected`] |
//! | Lifecycle | [`Error::SocketClosed`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::SocketId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when server options fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Handshake Errors
    // ========================================================================
    /// Transport is not enabled on this server.
    #[error("Unknown transport: {name}")]
    UnknownTransport {
        /// Name reported by the offending transport.
        name: String,
    },

    /// No live socket with this identifier.
    #[error("Unknown socket: {id}")]
    UnknownSocket {
        /// The identifier that was looked up.
        id: SocketId,
    },

    /// Offered transport is not a valid upgrade target.
    #[error("Upgrade rejected: {from} cannot upgrade to {to}")]
    UpgradeRejected {
        /// Name of the socket's current transport.
        from: String,
        /// Name of the offered transport.
        to: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The socket's event loop has terminated.
    ///
    /// Returned by mutating calls on a [`Socket`](crate::Socket) handle
    /// after the connection finished closing.
    #[error("Socket closed")]
    SocketClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unknown transport error.
    #[inline]
    pub fn unknown_transport(name: impl Into<String>) -> Self {
        Self::UnknownTransport { name: name.into() }
    }

    /// Creates an unknown socket error.
    #[inline]
    pub fn unknown_socket(id: SocketId) -> Self {
        Self::UnknownSocket { id }
    }

    /// Creates an upgrade rejected error.
    #[inline]
    pub fn upgrade_rejected(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UpgradeRejected {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the protocol error code for request-level rejections.
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | 0 | Unknown transport |
    /// | 1 | Unknown session id |
    /// | 3 | Bad request |
    #[must_use]
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::UnknownTransport { .. } => Some(0),
            Self::UnknownSocket { .. } => Some(1),
            Self::UpgradeRejected { .. } => Some(3),
            _ => None,
        }
    }

    /// Returns `true` if the error rejects a client request.
    #[inline]
    #[must_use]
    pub fn is_handshake_error(&self) -> bool {
        self.code().is_some()
    }
}

// ============================================================================
// CloseReason
// ============================================================================

/// Why a connection reached the `closed` state.
///
/// Carried by the `close` notification. The string forms are part of the
/// protocol's observable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// No inbound activity within `ping_interval + ping_timeout`.
    PingTimeout,
    /// The peer sent an `error` packet.
    ParseError,
    /// The current transport reported an I/O failure.
    TransportError,
    /// The current transport closed underneath the connection.
    TransportClose,
    /// The connection was closed locally.
    ForcedClose,
}

impl CloseReason {
    /// Returns the protocol string for this reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PingTimeout => "ping timeout",
            Self::ParseError => "parse error",
            Self::TransportError => "transport error",
            Self::TransportClose => "transport close",
            Self::ForcedClose => "forced close",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::upgrade_rejected("websocket", "polling");
        assert_eq!(
            err.to_string(),
            "Upgrade rejected: websocket cannot upgrade to polling"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("ping_interval must be non-zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: ping_interval must be non-zero"
        );
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_protocol_codes() {
        assert_eq!(Error::unknown_transport("flash").code(), Some(0));
        assert_eq!(Error::unknown_socket(SocketId::from("abc")).code(), Some(1));
        assert_eq!(Error::upgrade_rejected("a", "b").code(), Some(3));
        assert!(!Error::SocketClosed.is_handshake_error());
        assert!(Error::unknown_transport("flash").is_handshake_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_close_reason_strings() {
        assert_eq!(CloseReason::PingTimeout.to_string(), "ping timeout");
        assert_eq!(CloseReason::ParseError.to_string(), "parse error");
        assert_eq!(CloseReason::TransportError.to_string(), "transport error");
        assert_eq!(CloseReason::TransportClose.to_string(), "transport close");
        assert_eq!(CloseReason::ForcedClose.to_string(), "forced close");
    }
}
