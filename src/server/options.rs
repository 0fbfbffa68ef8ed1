//! Server configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use engine_socket::ServerOptions;
//!
//! let options = ServerOptions::new()
//!     .with_ping_interval(Duration::from_secs(10))
//!     .with_ping_timeout(Duration::from_secs(3))
//!     .with_transports(["websocket"]);
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::protocol::PacketData;
use crate::protocol::handshake::millis;
use crate::transport::{POLLING, WEBSOCKET};

// ============================================================================
// Constants
// ============================================================================

/// Default client ping period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(25_000);

/// Default grace period after a missed ping.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default deadline for an upgrade handshake.
pub const DEFAULT_UPGRADE_TIMEOUT: Duration = Duration::from_millis(10_000);

// ============================================================================
// ServerOptions
// ============================================================================

/// Timing and transport configuration shared by every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Period at which clients are expected to ping.
    pub ping_interval: Duration,

    /// Grace period added to `ping_interval` before a silent client is dropped.
    pub ping_timeout: Duration,

    /// How long an upgrade candidate has to confirm.
    pub upgrade_timeout: Duration,

    /// Enabled transport names.
    pub transports: Vec<String>,

    /// Whether connections may move to a better transport.
    pub allow_upgrades: bool,

    /// Message sent right after the `open` packet.
    pub initial_packet: Option<PacketData>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ServerOptions {
    /// Creates options with the protocol defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            upgrade_timeout: DEFAULT_UPGRADE_TIMEOUT,
            transports: vec![POLLING.to_string(), WEBSOCKET.to_string()],
            allow_upgrades: true,
            initial_packet: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ServerOptions {
    /// Sets the ping interval.
    #[inline]
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Sets the ping timeout.
    #[inline]
    #[must_use]
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Sets the upgrade timeout.
    #[inline]
    #[must_use]
    pub fn with_upgrade_timeout(mut self, timeout: Duration) -> Self {
        self.upgrade_timeout = timeout;
        self
    }

    /// Replaces the enabled transports.
    #[inline]
    #[must_use]
    pub fn with_transports(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.transports = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables upgrades.
    #[inline]
    #[must_use]
    pub fn with_allow_upgrades(mut self, allow: bool) -> Self {
        self.allow_upgrades = allow;
        self
    }

    /// Sets a message to send right after the handshake.
    #[inline]
    #[must_use]
    pub fn with_initial_packet(mut self, data: impl Into<PacketData>) -> Self {
        self.initial_packet = Some(data.into());
        self
    }
}

// ============================================================================
// Queries
// ============================================================================

impl ServerOptions {
    /// Returns `true` if `name` is an enabled transport.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.transports.iter().any(|t| t == name)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero durations, an empty transport
    /// list, or a transport listed twice.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("ping_interval", self.ping_interval),
            ("ping_timeout", self.ping_timeout),
            ("upgrade_timeout", self.upgrade_timeout),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(Error::config(format!("{name} must be greater than zero")));
            }
            millis(name, value)?;
        }

        let deadline = self
            .ping_interval
            .checked_add(self.ping_timeout)
            .ok_or_else(|| Error::config("ping_interval + ping_timeout overflows"))?;
        millis("ping_interval + ping_timeout", deadline)?;

        if self.transports.is_empty() {
            return Err(Error::config("at least one transport must be enabled"));
        }

        let mut seen = FxHashSet::default();
        for name in &self.transports {
            if !seen.insert(name.as_str()) {
                return Err(Error::config(format!("transport {name} listed twice")));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ServerOptions::default();
        assert_eq!(options.ping_interval, Duration::from_secs(25));
        assert_eq!(options.ping_timeout, Duration::from_secs(5));
        assert_eq!(options.upgrade_timeout, Duration::from_secs(10));
        assert_eq!(options.transports, vec!["polling", "websocket"]);
        assert!(options.allow_upgrades);
        assert!(options.initial_packet.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = ServerOptions::new()
            .with_ping_interval(Duration::from_millis(50))
            .with_ping_timeout(Duration::from_millis(20))
            .with_upgrade_timeout(Duration::from_millis(30))
            .with_transports(["websocket"])
            .with_allow_upgrades(false)
            .with_initial_packet("hi");

        assert_eq!(options.ping_interval, Duration::from_millis(50));
        assert!(options.is_enabled("websocket"));
        assert!(!options.is_enabled("polling"));
        assert!(!options.allow_upgrades);
        assert_eq!(options.initial_packet, Some(PacketData::from("hi")));
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let err = ServerOptions::new()
            .with_ping_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ping_timeout"));
    }

    #[test]
    fn test_validate_rejects_oversized_durations() {
        let err = ServerOptions::default()
            .with_ping_interval(Duration::MAX)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ServerOptions::default()
            .with_upgrade_timeout(Duration::MAX)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("upgrade_timeout"));

        let half = Duration::from_millis(u64::MAX / 2 + 1);
        let err = ServerOptions::default()
            .with_ping_interval(half)
            .with_ping_timeout(half)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ping_interval + ping_timeout"));
    }

    #[test]
    fn test_validate_rejects_bad_transport_lists() {
        let empty = ServerOptions::new().with_transports(Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(Error::Config { .. })));

        let duplicate = ServerOptions::new().with_transports(["polling", "polling"]);
        assert!(matches!(duplicate.validate(), Err(Error::Config { .. })));
    }
}
