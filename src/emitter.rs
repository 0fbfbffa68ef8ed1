//! Observer registration and undo-action lists.
//!
//! [`Emitter`] maps an event topic to an ordered list of handlers. Handlers
//! may be durable ([`Emitter::on`]) or one-shot ([`Emitter::once`]).
//! Dispatch runs over a snapshot taken under the lock, and the lock is
//! released before any handler runs, so handlers may register or remove
//! listeners (including themselves) while an event is being dispatched.
//!
//! [`Disposers`] is an ordered list of undo actions. Components that attach
//! listeners push the matching detachment here and run the whole list when
//! the phase that owns them ends.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::identifiers::ListenerId;

// ============================================================================
// Types
// ============================================================================

/// An event that can be routed by topic.
pub trait Topic: Send + Sync + 'static {
    /// Topic key used to select handlers.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Returns the topic of this event.
    fn kind(&self) -> Self::Kind;
}

/// Shared handler callback.
type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// One registration in a topic's handler list.
struct Listener<E> {
    id: ListenerId,
    once: bool,
    handler: Handler<E>,
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            handler: Arc::clone(&self.handler),
        }
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Topic-keyed observer registry.
///
/// # Example
///
/// ```ignore
/// let emitter = Emitter::<TransportEvent>::new();
/// let id = emitter.on(TransportEventKind::Drain, |_| println!("drained"));
/// emitter.emit(&TransportEvent::Drain);
/// emitter.off(id);
/// ```
pub struct Emitter<E: Topic> {
    listeners: Mutex<FxHashMap<E::Kind, Vec<Listener<E>>>>,
}

impl<E: Topic> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Topic> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let counts: FxHashMap<E::Kind, usize> =
            listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("Emitter").field("listeners", &counts).finish()
    }
}

impl<E: Topic> Emitter<E> {
    /// Creates an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(FxHashMap::default()),
        }
    }

    /// Registers a durable handler for `kind`.
    pub fn on<F>(&self, kind: E::Kind, handler: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(kind, false, Arc::new(handler))
    }

    /// Registers a handler that runs for the next `kind` event only.
    pub fn once<F>(&self, kind: E::Kind, handler: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(kind, true, Arc::new(handler))
    }

    /// Removes a registration.
    ///
    /// Returns `false` if the id was unknown (already removed or fired).
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        for list in listeners.values_mut() {
            if let Some(pos) = list.iter().position(|l| l.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Dispatches `event` to every handler registered for its topic.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Listener<E>> = {
            let mut listeners = self.listeners.lock();
            let Some(list) = listeners.get_mut(&event.kind()) else {
                return 0;
            };
            let snapshot = list.clone();
            list.retain(|l| !l.once);
            snapshot
        };

        for listener in &snapshot {
            (listener.handler)(event);
        }
        snapshot.len()
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    fn register(&self, kind: E::Kind, once: bool, handler: Handler<E>) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push(Listener { id, once, handler });
        id
    }
}

// ============================================================================
// Disposers
// ============================================================================

/// Ordered list of undo actions.
#[derive(Default)]
pub struct Disposers {
    actions: Vec<Box<dyn FnOnce() + Send>>,
}

impl fmt::Debug for Disposers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposers")
            .field("pending", &self.actions.len())
            .finish()
    }
}

impl Disposers {
    /// Creates an empty list.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an undo action.
    pub fn push<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.actions.push(Box::new(action));
    }

    /// Number of pending actions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs every action in registration order and empties the list.
    pub fn run_all(&mut self) {
        for action in std::mem::take(&mut self.actions) {
            action();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
