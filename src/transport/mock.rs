//! In-memory transport for tests.
//!
//! Records every batch it is handed and lets the test play the remote side:
//! deliver packets, report drains, fail, or close.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::emitter::Emitter;
use crate::protocol::Packet;
use crate::socket::ReadyState;

use super::{CloseCallback, Transport, TransportEvent};

#[derive(Debug)]
struct MockState {
    writable: bool,
    ready_state: ReadyState,
    sent: Vec<Vec<Packet>>,
    close_calls: usize,
    discarded: bool,
}

/// Scriptable transport double.
#[derive(Debug)]
pub(crate) struct MockTransport {
    name: String,
    framing: bool,
    state: Mutex<MockState>,
    events: Emitter<TransportEvent>,
}

impl MockTransport {
    /// Creates an open, writable transport.
    pub(crate) fn new(name: &str, framing: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            framing,
            state: Mutex::new(MockState {
                writable: true,
                ready_state: ReadyState::Open,
                sent: Vec::new(),
                close_calls: 0,
                discarded: false,
            }),
            events: Emitter::new(),
        })
    }

    /// Long-polling style transport (no framing).
    pub(crate) fn polling() -> Arc<Self> {
        Self::new(super::POLLING, false)
    }

    /// Websocket style transport (per-packet framing).
    pub(crate) fn websocket() -> Arc<Self> {
        Self::new(super::WEBSOCKET, true)
    }

    pub(crate) fn set_writable(&self, writable: bool) {
        self.state.lock().writable = writable;
    }

    /// Delivers an inbound packet.
    pub(crate) fn receive(&self, packet: Packet) {
        self.events.emit(&TransportEvent::Packet(packet));
    }

    /// Reports one completed write unit.
    pub(crate) fn drain(&self) {
        self.events.emit(&TransportEvent::Drain);
    }

    /// Reports an I/O failure.
    pub(crate) fn fail(&self, description: &str) {
        self.events.emit(&TransportEvent::Error(description.to_string()));
    }

    /// Remote side hung up.
    pub(crate) fn remote_close(&self) {
        self.state.lock().ready_state = ReadyState::Closed;
        self.events.emit(&TransportEvent::Close);
    }

    /// Every batch handed to `send`, in order.
    pub(crate) fn sent(&self) -> Vec<Vec<Packet>> {
        self.state.lock().sent.clone()
    }

    /// All sent packets flattened, in order.
    pub(crate) fn sent_packets(&self) -> Vec<Packet> {
        self.state.lock().sent.iter().flatten().cloned().collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().ready_state == ReadyState::Closed
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    pub(crate) fn is_discarded(&self) -> bool {
        self.state.lock().discarded
    }

    pub(crate) fn listener_total(&self) -> usize {
        use super::TransportEventKind::{Close, Drain, Error, Packet};
        [Packet, Drain, Close, Error]
            .into_iter()
            .map(|kind| self.events.listener_count(kind))
            .sum()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_writable(&self) -> bool {
        let state = self.state.lock();
        state.writable && state.ready_state == ReadyState::Open
    }

    fn supports_framing(&self) -> bool {
        self.framing
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    fn send(&self, packets: Vec<Packet>) {
        self.state.lock().sent.push(packets);
    }

    fn close(&self, on_complete: Option<CloseCallback>) {
        {
            let mut state = self.state.lock();
            state.close_calls += 1;
            if matches!(state.ready_state, ReadyState::Closing | ReadyState::Closed) {
                return;
            }
            state.ready_state = ReadyState::Closed;
        }
        if let Some(callback) = on_complete {
            callback();
        }
    }

    fn discard(&self) {
        self.state.lock().discarded = true;
    }

    fn events(&self) -> &Emitter<TransportEvent> {
        &self.events
    }
}

/// Lets the socket event loop process everything queued so far.
///
/// Tests run on a paused clock, so the short sleep only returns once every
/// other task is idle.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Installs a test log subscriber honouring `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
