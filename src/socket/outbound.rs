//! Ordered outbound buffer and send-completion sequencing.
//!
//! Packets are buffered in submission order and handed to the transport in
//! batches. Every batch (or, on framing transports, every packet in it)
//! leaves one entry in the completion queue; each `drain` the transport
//! reports completes the oldest entry.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use crate::protocol::Packet;

// ============================================================================
// Types
// ============================================================================

/// Callback fired once a packet has been written by the transport.
pub type SendCallback = Box<dyn FnOnce() + Send>;

/// A buffered packet and its optional completion callback.
struct PendingWrite {
    packet: Packet,
    callback: Option<SendCallback>,
}

/// One entry of the completion queue.
pub(crate) enum SentCallback {
    /// A single framed packet.
    Packet(Option<SendCallback>),
    /// Every callback of an unframed batch, fired together.
    Batch(Vec<SendCallback>),
}

impl SentCallback {
    /// Fires the callbacks in submission order. Returns how many ran.
    pub(crate) fn invoke(self) -> usize {
        match self {
            Self::Packet(None) => 0,
            Self::Packet(Some(callback)) => {
                callback();
                1
            }
            Self::Batch(callbacks) => {
                let count = callbacks.len();
                for callback in callbacks {
                    callback();
                }
                count
            }
        }
    }
}

// ============================================================================
// OutboundBuffer
// ============================================================================

/// Outbound packets waiting for a writable transport.
#[derive(Default)]
pub(crate) struct OutboundBuffer {
    writes: Vec<PendingWrite>,
    sent: VecDeque<SentCallback>,
}

impl fmt::Debug for OutboundBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundBuffer")
            .field("buffered", &self.writes.len())
            .field("awaiting_drain", &self.sent.len())
            .finish()
    }
}

impl OutboundBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a packet.
    pub(crate) fn push(&mut self, packet: Packet, callback: Option<SendCallback>) {
        self.writes.push(PendingWrite { packet, callback });
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.writes.len()
    }

    /// Copies of the buffered packets, oldest first.
    pub(crate) fn packets(&self) -> Vec<Packet> {
        self.writes.iter().map(|w| w.packet.clone()).collect()
    }

    /// Completion entries still waiting for a drain.
    #[inline]
    pub(crate) fn awaiting_drain(&self) -> usize {
        self.sent.len()
    }

    /// Swaps the buffer for an empty one and queues its completions.
    ///
    /// Without framing the transport writes the batch as one unit, so all
    /// of its callbacks share one entry. With framing every packet gets its
    /// own entry, including packets sent without a callback.
    pub(crate) fn take_batch(&mut self, framing: bool) -> Vec<Packet> {
        let writes = std::mem::take(&mut self.writes);
        let mut packets = Vec::with_capacity(writes.len());

        if framing {
            for write in writes {
                self.sent.push_back(SentCallback::Packet(write.callback));
                packets.push(write.packet);
            }
        } else {
            let mut callbacks = Vec::new();
            for write in writes {
                callbacks.extend(write.callback);
                packets.push(write.packet);
            }
            self.sent.push_back(SentCallback::Batch(callbacks));
        }

        packets
    }

    /// Accounts for a unit written outside the buffer (e.g. a probe nudge).
    pub(crate) fn note_unbuffered_send(&mut self, framing: bool, packets: usize) {
        if framing {
            for _ in 0..packets {
                self.sent.push_back(SentCallback::Packet(None));
            }
        } else {
            self.sent.push_back(SentCallback::Batch(Vec::new()));
        }
    }

    /// Pops the completion entry for the oldest outstanding unit.
    pub(crate) fn complete_next(&mut self) -> Option<SentCallback> {
        self.sent.pop_front()
    }

    /// Drops the completion entries of units already handed to a transport.
    /// Returns how many were dropped.
    pub(crate) fn discard_completions(&mut self) -> usize {
        let dropped = self.sent.len();
        self.sent.clear();
        dropped
    }

    /// Drops every pending callback but keeps the buffered packets.
    pub(crate) fn drop_callbacks(&mut self) {
        self.sent.clear();
        for write in &mut self.writes {
            write.callback = None;
        }
    }

    /// Drops the buffered packets.
    pub(crate) fn clear(&mut self) {
        self.writes.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
