//! Transport upgrade handshake.
//!
//! Moves a connection onto a better transport (typically polling →
//! websocket) without losing or duplicating packets. The original transport
//! keeps carrying all application traffic until the client confirms:
//!
//! ```text
//!  client (candidate)              socket
//!  ──────────────────              ──────
//!  ping "probe"          ───►      pong "probe" on the candidate,
//!                                  emit `upgrading`, nudge polling with noop
//!  upgrade               ───►      commit: discard + close the old transport,
//!                                  bind the candidate, flush the buffer
//!  anything else         ───►      abort: close the candidate
//! ```
//!
//! The attempt also aborts on its timeout, on the candidate's error or close,
//! and when the socket itself closes. Aborting leaves `upgraded`, the current
//! transport, and the buffer untouched.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::emitter::Disposers;
use crate::protocol::{Packet, PacketType};
use crate::transport::{Transport, TransportEvent, TransportEventKind};

use super::binding::{BindingId, TransportBinding, forward};
use super::command::Mailbox;
use super::core::SocketCore;
use super::event::SocketEvent;
use super::state::ReadyState;
use super::timer::{TimerKind, TimerSlot};

// ============================================================================
// Constants
// ============================================================================

/// Period of the `noop` nudge sent on a polling transport while probing.
pub(crate) const PROBE_NUDGE_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// AbortReason
// ============================================================================

/// Why an upgrade attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AbortReason {
    Timeout,
    CandidateClosed,
    CandidateError(String),
    UnexpectedPacket(PacketType),
    SocketClosed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("upgrade timeout"),
            Self::CandidateClosed => f.write_str("candidate transport closed"),
            Self::CandidateError(e) => write!(f, "candidate transport error: {e}"),
            Self::UnexpectedPacket(t) => write!(f, "unexpected {t} packet during probe"),
            Self::SocketClosed => f.write_str("socket closed"),
        }
    }
}

// ============================================================================
// UpgradeAttempt
// ============================================================================

/// State of one in-flight upgrade.
///
/// Built before any listener is attached; the listeners only capture the
/// mailbox and the attempt's binding id.
#[derive(Debug)]
pub(crate) struct UpgradeAttempt {
    binding: BindingId,
    transport: Arc<dyn Transport>,
    probed: bool,
    timeout: TimerSlot,
    nudge: TimerSlot,
    disposers: Disposers,
}

impl UpgradeAttempt {
    /// Attaches handshake listeners to `transport` and arms the timeout.
    fn start(transport: Arc<dyn Transport>, timeout: Duration, mailbox: &Mailbox) -> Self {
        let binding = BindingId::next();
        let events = transport.events();
        let listeners = [
            events.on(TransportEventKind::Packet, forward(binding, mailbox)),
            events.once(TransportEventKind::Close, forward(binding, mailbox)),
            events.once(TransportEventKind::Error, forward(binding, mailbox)),
        ];

        let mut disposers = Disposers::new();
        for listener in listeners {
            let transport = Arc::clone(&transport);
            disposers.push(move || {
                transport.events().off(listener);
            });
        }

        let mut timeout_slot = TimerSlot::new(TimerKind::UpgradeTimeout);
        timeout_slot.start(timeout, mailbox);

        Self {
            binding,
            transport,
            probed: false,
            timeout: timeout_slot,
            nudge: TimerSlot::new(TimerKind::ProbeNudge),
            disposers,
        }
    }

    #[inline]
    pub(crate) fn binding(&self) -> BindingId {
        self.binding
    }

    pub(crate) fn claim_timeout(&mut self, generation: u64) -> bool {
        self.timeout.claim(generation)
    }

    pub(crate) fn claim_nudge(&mut self, generation: u64) -> bool {
        self.nudge.claim(generation)
    }

    /// Cancels both timers and detaches handshake listeners. Idempotent.
    fn cleanup(&mut self) {
        self.timeout.cancel();
        self.nudge.cancel();
        self.disposers.run_all();
    }
}

// ============================================================================
// SocketCore - Upgrade
// ============================================================================

impl SocketCore {
    /// Starts probing `transport` as the socket's next transport.
    pub(super) fn maybe_upgrade(&mut self, transport: Arc<dyn Transport>) {
        let refusal = if self.ready_state() != ReadyState::Open {
            Some("socket is not open")
        } else if self.upgrade.is_some() {
            Some("upgrade already in progress")
        } else if self.is_upgraded() {
            Some("socket already upgraded")
        } else {
            None
        };

        if let Some(refusal) = refusal {
            debug!(socket = %self.shared.id, candidate = transport.name(), refusal, "Upgrade refused");
            transport.close(None);
            return;
        }

        debug!(
            socket = %self.shared.id,
            from = self.binding.transport().name(),
            to = transport.name(),
            "Upgrade attempt started"
        );
        self.upgrade = Some(UpgradeAttempt::start(
            transport,
            self.upgrade_timeout,
            &self.mailbox,
        ));
        self.set_upgrading(true);
    }

    pub(super) fn on_candidate_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Packet(packet) => self.on_candidate_packet(packet),
            TransportEvent::Close => self.abort_upgrade(AbortReason::CandidateClosed),
            TransportEvent::Error(e) => self.abort_upgrade(AbortReason::CandidateError(e)),
            TransportEvent::Drain => {}
        }
    }

    fn on_candidate_packet(&mut self, packet: Packet) {
        if packet.is_probe_ping() {
            let Some(attempt) = self.upgrade.as_mut() else {
                return;
            };
            attempt.transport.send(vec![Packet::probe_pong()]);
            attempt.probed = true;
            let candidate = Arc::clone(&attempt.transport);

            trace!(socket = %self.shared.id, candidate = candidate.name(), "Probe answered");
            self.emit(SocketEvent::Upgrading(candidate));

            if let Some(attempt) = self.upgrade.as_mut() {
                attempt.nudge.start_periodic(PROBE_NUDGE_INTERVAL, &self.mailbox);
            }
        } else if packet.packet_type() == PacketType::Upgrade
            && self.ready_state() != ReadyState::Closed
        {
            self.commit_upgrade();
        } else {
            self.abort_upgrade(AbortReason::UnexpectedPacket(packet.packet_type()));
        }
    }

    /// Makes the candidate the socket's transport.
    fn commit_upgrade(&mut self) {
        let Some(mut attempt) = self.upgrade.take() else {
            return;
        };
        attempt.cleanup();
        self.set_upgrading(false);

        let previous = Arc::clone(self.binding.transport());
        previous.discard();
        self.shared.status.lock().upgraded = true;
        self.clear_transport();
        let dropped = self.shared.outbound.lock().discard_completions();
        if dropped > 0 {
            trace!(socket = %self.shared.id, dropped, "Dropped completions of the previous transport");
        }

        let candidate = Arc::clone(&attempt.transport);
        self.binding = TransportBinding::bind(Arc::clone(&candidate), attempt.binding, &self.mailbox);
        self.shared.status.lock().transport = candidate.name().to_string();

        debug!(
            socket = %self.shared.id,
            from = previous.name(),
            to = candidate.name(),
            probed = attempt.probed,
            "Upgrade committed"
        );
        self.emit(SocketEvent::Upgrade(Arc::clone(&candidate)));
        self.liveness.reset(&self.mailbox);
        self.flush();

        if self.ready_state() == ReadyState::Closing {
            candidate.close(Some(self.forced_close_callback()));
        }
    }

    pub(super) fn on_upgrade_timeout(&mut self) {
        let candidate = self.upgrade.as_ref().map(|u| Arc::clone(&u.transport));
        self.abort_upgrade(AbortReason::Timeout);
        if let Some(candidate) = candidate
            && candidate.ready_state() == ReadyState::Open
        {
            candidate.close(None);
        }
    }

    /// Abandons the attempt, if any, when the socket itself closes.
    pub(super) fn abort_upgrade_for_close(&mut self) {
        self.abort_upgrade(AbortReason::SocketClosed);
    }

    fn abort_upgrade(&mut self, reason: AbortReason) {
        let Some(mut attempt) = self.upgrade.take() else {
            return;
        };
        attempt.cleanup();
        self.set_upgrading(false);

        debug!(
            socket = %self.shared.id,
            candidate = attempt.transport.name(),
            %reason,
            "Upgrade aborted"
        );
        if reason != AbortReason::Timeout {
            attempt.transport.close(None);
        }
    }

    /// Makes a polling transport cycle so the client sees the probe reply.
    pub(super) fn nudge_polling(&mut self) {
        let transport = Arc::clone(self.binding.transport());
        if !transport.is_polling() || !transport.is_writable() {
            return;
        }

        trace!(socket = %self.shared.id, "Nudging polling transport");
        self.shared
            .outbound
            .lock()
            .note_unbuffered_send(transport.supports_framing(), 1);
        transport.send(vec![Packet::noop()]);
    }
}
