//! Attachment of a socket to its current transport.
//!
//! Binding registers the socket's listeners on the transport's emitter and
//! records the matching detachments in a [`Disposers`] list. Every forwarded
//! notification is tagged with the binding's id so the event loop can tell
//! the current transport apart from superseded ones.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::emitter::Disposers;
use crate::transport::{Transport, TransportEvent, TransportEventKind};

use super::command::{Command, Mailbox};

// ============================================================================
// BindingId
// ============================================================================

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Tag identifying one attachment of a transport to a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BindingId(u64);

impl BindingId {
    pub(crate) fn next() -> Self {
        Self(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Listener that forwards transport notifications into a socket's mailbox.
pub(crate) fn forward(
    binding: BindingId,
    mailbox: &Mailbox,
) -> impl Fn(&TransportEvent) + Send + Sync + 'static {
    let mailbox = mailbox.clone();
    move |event| {
        if mailbox
            .send(Command::Transport {
                binding,
                event: event.clone(),
            })
            .is_err()
        {
            trace!(?binding, "Transport notification after socket loop ended");
        }
    }
}

// ============================================================================
// TransportBinding
// ============================================================================

/// The transport currently carrying a socket's traffic.
#[derive(Debug)]
pub(crate) struct TransportBinding {
    id: BindingId,
    transport: Arc<dyn Transport>,
    disposers: Disposers,
}

impl TransportBinding {
    /// Attaches the socket behind `mailbox` to `transport`.
    ///
    /// Errors and close fire once; packets and drains are durable.
    pub(crate) fn bind(transport: Arc<dyn Transport>, id: BindingId, mailbox: &Mailbox) -> Self {
        let events = transport.events();
        let listeners = [
            events.once(TransportEventKind::Error, forward(id, mailbox)),
            events.on(TransportEventKind::Packet, forward(id, mailbox)),
            events.on(TransportEventKind::Drain, forward(id, mailbox)),
            events.once(TransportEventKind::Close, forward(id, mailbox)),
        ];

        let mut disposers = Disposers::new();
        for listener in listeners {
            let transport = Arc::clone(&transport);
            disposers.push(move || {
                transport.events().off(listener);
            });
        }

        Self {
            id,
            transport,
            disposers,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> BindingId {
        self.id
    }

    #[inline]
    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Detaches from the transport and closes it.
    ///
    /// Errors the superseded transport raises afterwards are logged and
    /// go nowhere else.
    pub(crate) fn unbind(&mut self) {
        self.disposers.run_all();

        let name = self.transport.name().to_string();
        self.transport
            .events()
            .on(TransportEventKind::Error, move |event| {
                if let TransportEvent::Error(description) = event {
                    warn!(transport = %name, error = %description, "Error from superseded transport");
                }
            });

        self.transport.close(None);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    use crate::protocol::Packet;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_bind_forwards_tagged_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = MockTransport::polling();
        let binding = TransportBinding::bind(transport.clone(), BindingId::next(), &tx);

        transport.receive(Packet::ping(None));
        transport.drain();

        for expected in [TransportEvent::Packet(Packet::ping(None)), TransportEvent::Drain] {
            match rx.try_recv() {
                Ok(Command::Transport { binding: tag, event }) => {
                    assert_eq!(tag, binding.id());
                    assert_eq!(event, expected);
                }
                _ => panic!("expected a forwarded transport event"),
            }
        }
    }

    #[test]
    fn test_error_and_close_forward_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = MockTransport::polling();
        let _binding = TransportBinding::bind(transport.clone(), BindingId::next(), &tx);

        transport.fail("a");
        transport.fail("b");
        transport.remote_close();
        transport.remote_close();

        let mut forwarded = 0;
        while rx.try_recv().is_ok() {
            forwarded += 1;
        }
        assert_eq!(forwarded, 2);
    }

    #[test]
    fn test_unbind_detaches_and_closes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = MockTransport::polling();
        let mut binding = TransportBinding::bind(transport.clone(), BindingId::next(), &tx);
        assert_eq!(transport.listener_total(), 4);

        binding.unbind();

        // Only the swallow-all error listener remains.
        assert_eq!(transport.listener_total(), 1);
        assert!(transport.is_closed());

        transport.receive(Packet::noop());
        transport.fail("late");
        assert!(rx.try_recv().is_err());
    }
}
