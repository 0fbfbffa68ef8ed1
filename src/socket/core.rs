//! Socket event loop and lifecycle state machine.
//!
//! [`SocketCore`] owns everything that mutates a connection and runs inside
//! one spawned task, so all state changes happen on a single timeline. It
//! processes, in arrival order:
//!
//! - Commands from [`Socket`](super::Socket) handles
//! - Notifications forwarded from the current and candidate transports
//! - Timer firings (heartbeat, upgrade timeout, probe nudge)

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{CloseReason, Result};
use crate::protocol::{Handshake, Packet, PacketData, PacketOptions, PacketType};
use crate::transport::{Transport, TransportEvent};

use super::binding::{BindingId, TransportBinding};
use super::command::{Command, Mailbox};
use super::event::SocketEvent;
use super::liveness::LivenessMonitor;
use super::outbound::SendCallback;
use super::owner::SocketOwner;
use super::state::{ReadyState, Shared};
use super::timer::TimerKind;
use super::upgrade::UpgradeAttempt;

// ============================================================================
// SocketCore
// ============================================================================

/// Mutable state of one connection, owned by its event loop.
pub(crate) struct SocketCore {
    pub(super) shared: Arc<Shared>,
    pub(super) owner: Arc<dyn SocketOwner>,
    pub(super) mailbox: Mailbox,
    pub(super) binding: TransportBinding,
    pub(super) liveness: LivenessMonitor,
    pub(super) upgrade: Option<UpgradeAttempt>,
    pub(super) upgrade_timeout: Duration,
    /// Set by `close` while packets are still buffered: the transport close
    /// waits for the next drain. Holds the `discard` flag.
    close_on_drain: Option<bool>,
    finished: bool,
}

// ============================================================================
// SocketCore - Open
// ============================================================================

impl SocketCore {
    /// Binds the initial transport and runs the open sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the timings do not
    /// fit the handshake, or [`Error::Json`](crate::Error::Json) if it cannot
    /// be serialized. Nothing is attached to the transport in either case.
    pub(crate) fn open(
        shared: Arc<Shared>,
        owner: Arc<dyn SocketOwner>,
        transport: Arc<dyn Transport>,
        mailbox: Mailbox,
    ) -> Result<Self> {
        let options = owner.options().clone();
        let handshake = Handshake::new(
            shared.id.clone(),
            owner.upgrades(transport.name()),
            options.ping_interval,
            options.ping_timeout,
        )?
        .to_packet()?;

        let binding = TransportBinding::bind(transport, BindingId::next(), &mailbox);
        let mut core = Self {
            shared,
            owner,
            mailbox,
            binding,
            liveness: LivenessMonitor::new(options.ping_interval, options.ping_timeout),
            upgrade: None,
            upgrade_timeout: options.upgrade_timeout,
            close_on_drain: None,
            finished: false,
        };

        core.push_packet(handshake, None);
        core.set_ready_state(ReadyState::Open);
        if let Some(initial) = options.initial_packet {
            core.enqueue(PacketType::Message, Some(initial), None, None);
        }

        debug!(
            socket = %core.shared.id,
            transport = core.binding.transport().name(),
            deadline = ?core.liveness.deadline(),
            "Socket opened"
        );
        core.emit(SocketEvent::Open);
        core.liveness.reset(&core.mailbox);

        Ok(core)
    }
}

// ============================================================================
// SocketCore - Event Loop
// ============================================================================

impl SocketCore {
    /// Processes commands until the socket has closed and released its buffer.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
            if self.finished {
                break;
            }
        }

        debug!(socket = %self.shared.id, "Socket event loop terminated");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Send {
                packet_type,
                data,
                options,
                callback,
            } => self.enqueue(packet_type, data, options, callback),

            Command::Close { discard } => self.close(discard),

            Command::Upgrade(transport) => self.maybe_upgrade(transport),

            Command::Transport { binding, event } => self.route_transport_event(binding, event),

            Command::TransportClosed => self.on_close(CloseReason::ForcedClose, None),

            Command::Timer { kind, generation } => self.on_timer(kind, generation),

            Command::ClearBuffer => {
                self.shared.outbound.lock().clear();
                if self.ready_state() == ReadyState::Closed {
                    self.finished = true;
                }
            }
        }
    }

    fn route_transport_event(&mut self, binding: BindingId, event: TransportEvent) {
        if binding == self.binding.id() {
            self.on_transport_event(event);
        } else if self.upgrade.as_ref().is_some_and(|u| u.binding() == binding) {
            self.on_candidate_event(event);
        } else {
            trace!(socket = %self.shared.id, ?binding, ?event, "Dropped notification from superseded transport");
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Packet(packet) => self.on_packet(packet),
            TransportEvent::Drain => {
                self.flush();
                self.complete_next_send();
            }
            TransportEvent::Close => self.on_close(CloseReason::TransportClose, None),
            TransportEvent::Error(description) => {
                debug!(socket = %self.shared.id, error = %description, "Transport error");
                self.on_close(CloseReason::TransportError, Some(description));
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind, generation: u64) {
        match kind {
            TimerKind::Heartbeat => {
                if self.liveness.expired(generation) {
                    self.on_close(CloseReason::PingTimeout, None);
                    return;
                }
            }
            TimerKind::UpgradeTimeout => {
                if self.upgrade.as_mut().is_some_and(|u| u.claim_timeout(generation)) {
                    self.on_upgrade_timeout();
                    return;
                }
            }
            TimerKind::ProbeNudge => {
                if self.upgrade.as_mut().is_some_and(|u| u.claim_nudge(generation)) {
                    self.nudge_polling();
                    return;
                }
            }
        }
        trace!(socket = %self.shared.id, ?kind, generation, "Stale timer firing ignored");
    }
}

// ============================================================================
// SocketCore - Inbound
// ============================================================================

impl SocketCore {
    fn on_packet(&mut self, packet: Packet) {
        if self.ready_state() != ReadyState::Open {
            trace!(socket = %self.shared.id, packet_type = %packet.packet_type(), "Packet received on a socket that is not open");
            return;
        }

        trace!(socket = %self.shared.id, packet_type = %packet.packet_type(), "Packet received");
        self.emit(SocketEvent::Packet(packet.clone()));
        self.liveness.reset(&self.mailbox);

        match packet.packet_type() {
            PacketType::Ping => {
                self.enqueue(PacketType::Pong, None, None, None);
                self.emit(SocketEvent::Heartbeat);
            }
            PacketType::Error => self.on_close(CloseReason::ParseError, None),
            PacketType::Message => {
                let data = packet
                    .data()
                    .cloned()
                    .unwrap_or_else(|| PacketData::Text(String::new()));
                self.emit(SocketEvent::Data(data.clone()));
                self.emit(SocketEvent::Message(data));
            }
            _ => {}
        }
    }
}

// ============================================================================
// SocketCore - Outbound
// ============================================================================

impl SocketCore {
    /// Builds a packet, buffers it, and tries to flush.
    ///
    /// Ignored once the socket is closing or closed.
    pub(super) fn enqueue(
        &mut self,
        packet_type: PacketType,
        data: Option<PacketData>,
        options: Option<PacketOptions>,
        callback: Option<SendCallback>,
    ) {
        if self.ready_state().is_shutting_down() {
            trace!(socket = %self.shared.id, %packet_type, "Send ignored on closing socket");
            return;
        }

        let packet = Packet::with_options(packet_type, data, PacketOptions::normalize(options));
        self.push_packet(packet, callback);
    }

    fn push_packet(&mut self, packet: Packet, callback: Option<SendCallback>) {
        self.emit(SocketEvent::PacketCreate(packet.clone()));
        self.shared.outbound.lock().push(packet, callback);
        self.flush();
    }

    /// Hands the buffered packets to the current transport if it can take them.
    pub(super) fn flush(&mut self) {
        if self.ready_state() == ReadyState::Closed {
            return;
        }

        let transport = Arc::clone(self.binding.transport());
        if !transport.is_writable() {
            return;
        }

        let batch = {
            let mut outbound = self.shared.outbound.lock();
            if outbound.is_empty() {
                return;
            }
            outbound.take_batch(transport.supports_framing())
        };

        trace!(socket = %self.shared.id, transport = transport.name(), packets = batch.len(), "Flushing");
        self.emit(SocketEvent::Flush(batch.clone()));
        self.owner.socket_flushed(&self.shared.id, &batch);

        transport.send(batch);

        self.emit(SocketEvent::Drain);
        self.owner.socket_drained(&self.shared.id);

        if let Some(discard) = self.close_on_drain.take() {
            self.close_transport(discard);
        }
    }

    fn complete_next_send(&mut self) {
        let (next, pending) = {
            let mut outbound = self.shared.outbound.lock();
            (outbound.complete_next(), outbound.awaiting_drain())
        };
        if let Some(callbacks) = next {
            let fired = callbacks.invoke();
            if fired > 0 {
                trace!(socket = %self.shared.id, fired, pending, "Send callbacks completed");
            }
        }
    }
}

// ============================================================================
// SocketCore - Close
// ============================================================================

impl SocketCore {
    /// Starts a graceful close.
    ///
    /// The transport close waits for the buffer to drain first. `discard`
    /// tells the transport its pending writes no longer matter.
    pub(super) fn close(&mut self, discard: bool) {
        if self.ready_state() != ReadyState::Open {
            return;
        }

        self.set_ready_state(ReadyState::Closing);
        debug!(socket = %self.shared.id, discard, "Socket closing");

        if !self.shared.outbound.lock().is_empty() {
            self.close_on_drain = Some(discard);
            return;
        }

        self.close_transport(discard);
    }

    fn close_transport(&mut self, discard: bool) {
        let transport = self.binding.transport();
        if discard {
            transport.discard();
        }
        transport.close(Some(self.forced_close_callback()));
    }

    /// Callback that completes the close once a transport has shut down.
    pub(super) fn forced_close_callback(&self) -> Box<dyn FnOnce() + Send> {
        let mailbox = self.mailbox.clone();
        Box::new(move || {
            let _ = mailbox.send(Command::TransportClosed);
        })
    }

    /// Final close. Idempotent: only the first call has any effect.
    pub(super) fn on_close(&mut self, reason: CloseReason, description: Option<String>) {
        if self.ready_state() == ReadyState::Closed {
            return;
        }

        self.set_ready_state(ReadyState::Closed);
        self.liveness.cancel();
        self.abort_upgrade_for_close();
        self.close_on_drain = None;

        // Observers of the close notification may still inspect the buffer;
        // it is dropped on the next loop turn.
        self.shared.outbound.lock().drop_callbacks();
        let _ = self.mailbox.send(Command::ClearBuffer);

        self.clear_transport();
        debug_assert!(!self.liveness.is_armed());

        debug!(socket = %self.shared.id, %reason, ?description, "Socket closed");
        self.emit(SocketEvent::Close {
            reason,
            description,
        });
    }

    /// Detaches from the current transport and stops the heartbeat.
    ///
    /// Whoever binds the next transport restarts the heartbeat.
    pub(super) fn clear_transport(&mut self) {
        self.binding.unbind();
        self.liveness.cancel();
    }
}

// ============================================================================
// SocketCore - Helpers
// ============================================================================

impl SocketCore {
    #[inline]
    pub(super) fn ready_state(&self) -> ReadyState {
        self.shared.status.lock().ready_state
    }

    fn set_ready_state(&self, ready_state: ReadyState) {
        self.shared.status.lock().ready_state = ready_state;
    }

    pub(super) fn set_upgrading(&self, upgrading: bool) {
        self.shared.status.lock().upgrading = upgrading;
    }

    #[inline]
    pub(super) fn is_upgraded(&self) -> bool {
        self.shared.status.lock().upgraded
    }

    /// Emits a notification. No lock is held while handlers run.
    #[inline]
    pub(super) fn emit(&self, event: SocketEvent) {
        self.shared.events.emit(&event);
    }
}
