//! Heartbeat deadline.
//!
//! The client pings every `ping_interval`; if nothing at all arrives within
//! `ping_interval + ping_timeout` the connection is considered dead.

use std::time::Duration;

use super::command::Mailbox;
use super::timer::{TimerKind, TimerSlot};

/// Owns the single heartbeat timer of a connection.
#[derive(Debug)]
pub(crate) struct LivenessMonitor {
    deadline: Duration,
    timer: TimerSlot,
}

impl LivenessMonitor {
    pub(crate) fn new(ping_interval: Duration, ping_timeout: Duration) -> Self {
        Self {
            deadline: ping_interval.saturating_add(ping_timeout),
            timer: TimerSlot::new(TimerKind::Heartbeat),
        }
    }

    /// Cancels any pending deadline and starts a fresh one.
    pub(crate) fn reset(&mut self, mailbox: &Mailbox) {
        self.timer.start(self.deadline, mailbox);
    }

    pub(crate) fn cancel(&mut self) {
        self.timer.cancel();
    }

    /// Returns `true` if this firing is the live deadline expiring.
    pub(crate) fn expired(&mut self, generation: u64) -> bool {
        self.timer.claim(generation)
    }

    #[inline]
    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_active()
    }

    #[inline]
    pub(crate) fn deadline(&self) -> Duration {
        self.deadline
    }
}
