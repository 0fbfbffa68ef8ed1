//! Cancellable timer slots.
//!
//! A timer is a spawned task that posts [`Command::Timer`] back into the
//! socket's mailbox. Each slot stamps its firings with a generation, and
//! cancelling bumps the generation, so a firing that was already queued when
//! its slot was cancelled or restarted is recognised and ignored.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};

use super::command::{Command, Mailbox};

// ============================================================================
// TimerKind
// ============================================================================

/// Which timer a firing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TimerKind {
    /// Liveness deadline.
    Heartbeat,
    /// Upgrade handshake deadline.
    UpgradeTimeout,
    /// Periodic `noop` on the polling transport while probing.
    ProbeNudge,
}

// ============================================================================
// TimerSlot
// ============================================================================

/// An optional timer handle with cancel-if-present semantics.
#[derive(Debug)]
pub(crate) struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    periodic: bool,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub(crate) const fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            periodic: false,
            handle: None,
        }
    }

    /// (Re)starts a one-shot timer.
    pub(crate) fn start(&mut self, after: Duration, mailbox: &Mailbox) {
        self.cancel();
        let (kind, generation) = (self.kind, self.generation);
        let mailbox = mailbox.clone();
        self.periodic = false;
        self.handle = Some(tokio::spawn(async move {
            sleep(after).await;
            let _ = mailbox.send(Command::Timer { kind, generation });
        }));
    }

    /// (Re)starts a repeating timer. The first firing is one `period` away.
    pub(crate) fn start_periodic(&mut self, period: Duration, mailbox: &Mailbox) {
        self.cancel();
        let (kind, generation) = (self.kind, self.generation);
        let mailbox = mailbox.clone();
        self.periodic = true;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if mailbox.send(Command::Timer { kind, generation }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Cancels the timer if one is scheduled. Safe to call repeatedly.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Claims a firing. Returns `false` for stale firings.
    ///
    /// A one-shot slot becomes inactive once its firing is claimed.
    pub(crate) fn claim(&mut self, generation: u64) -> bool {
        if self.handle.is_none() || generation != self.generation {
            return false;
        }
        if !self.periodic {
            self.handle = None;
        }
        true
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    fn fired(command: Command) -> (TimerKind, u64) {
        match command {
            Command::Timer { kind, generation } => (kind, generation),
            _ => panic!("expected a timer command"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::Heartbeat);
        slot.start(Duration::from_secs(5), &tx);

        let (kind, generation) = fired(rx.recv().await.unwrap());
        assert_eq!(kind, TimerKind::Heartbeat);
        assert!(slot.claim(generation));
        assert!(!slot.is_active());
        assert!(!slot.claim(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_makes_queued_firing_stale() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::Heartbeat);
        slot.start(Duration::from_millis(10), &tx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        // The first firing is queued; restarting must invalidate it.
        slot.start(Duration::from_millis(10), &tx);

        let (_, stale) = fired(rx.recv().await.unwrap());
        assert!(!slot.claim(stale));
        let (_, fresh) = fired(rx.recv().await.unwrap());
        assert!(slot.claim(fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::UpgradeTimeout);
        slot.start(Duration::from_millis(10), &tx);
        slot.cancel();
        slot.cancel();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert!(!slot.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_keeps_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new(TimerKind::ProbeNudge);
        slot.start_periodic(Duration::from_millis(100), &tx);

        for _ in 0..3 {
            let (kind, generation) = fired(rx.recv().await.unwrap());
            assert_eq!(kind, TimerKind::ProbeNudge);
            assert!(slot.claim(generation));
        }
        assert!(slot.is_active());
        slot.cancel();
    }
}
