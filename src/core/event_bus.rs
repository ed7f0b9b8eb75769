//! Pub/Sub Event Bus for decoupled model/view communication.
//!
//! Architecture:
//! - Views subscribe to event types with callbacks (immediate invocation)
//! - emit() invokes callbacks synchronously AND queues for deferred processing
//! - poll() returns queued events for batch processing in the app loop
//!
//! Callback order: FIFO (first-subscribed, first-called) within same event type.
//! Cross-type order undefined - don't rely on ordering between different event types.
//!
//! The model is single-threaded, so the bus is `Rc`-shared and not `Send`.
//! Dispatch is reentrant: a callback may emit further events, which are
//! delivered before the outer `emit()` returns. Nesting deeper than
//! [`MAX_DISPATCH_DEPTH`] drops the event and logs an error.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{error, trace, warn};

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Maximum nesting of emit() calls made from inside callbacks
pub const MAX_DISPATCH_DEPTH: usize = 64;

/// Marker trait for events.
pub trait Event: Any + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

// Blanket impl for all qualifying types
impl<T: Any + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased callback
type Callback = Rc<dyn Fn(&dyn Any)>;

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    /// Cleared on unsubscribe so an in-flight dispatch skips it
    active: Rc<Cell<bool>>,
    callback: Callback,
}

#[derive(Default)]
struct BusState {
    subscribers: RefCell<HashMap<TypeId, Vec<Subscriber>>>,
    queue: RefCell<Vec<BoxedEvent>>,
    next_id: Cell<u64>,
    depth: Cell<usize>,
}

impl BusState {
    /// Invoke callbacks for one event. Returns false if the depth guard tripped.
    fn dispatch(&self, type_id: TypeId, event: &dyn Any, name: &'static str) -> bool {
        let depth = self.depth.get();
        if depth >= MAX_DISPATCH_DEPTH {
            error!(
                "EventBus: dispatch depth {} exceeded, dropping {}",
                MAX_DISPATCH_DEPTH, name
            );
            return false;
        }

        // Snapshot so callbacks may subscribe/unsubscribe/emit freely
        let snapshot: Vec<(Rc<Cell<bool>>, Callback)> = self
            .subscribers
            .borrow()
            .get(&type_id)
            .map(|subs| {
                subs.iter()
                    .map(|s| (Rc::clone(&s.active), Rc::clone(&s.callback)))
                    .collect()
            })
            .unwrap_or_default();

        trace!("EventBus: {} -> {} subscriber(s)", name, snapshot.len());

        self.depth.set(depth + 1);
        for (active, cb) in snapshot {
            if active.get() {
                cb(event);
            }
        }
        self.depth.set(depth);
        true
    }

    fn enqueue(&self, event: BoxedEvent) {
        let mut queue = self.queue.borrow_mut();
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push(event);
    }

    fn emit<E: Event>(&self, event: E) {
        if self.dispatch(TypeId::of::<E>(), &event, event.type_name()) {
            self.enqueue(Box::new(event));
        }
    }

    fn emit_boxed(&self, event: BoxedEvent) {
        // IMPORTANT: go through the dyn Event vtable, not Box<dyn Event>'s blanket impl
        let type_id = (*event).as_any().type_id();
        if self.dispatch(type_id, (*event).as_any(), (*event).type_name()) {
            self.enqueue(event);
        }
    }
}

/// Pub/Sub Event Bus with deferred processing support.
///
/// Two modes of operation:
/// 1. Immediate: subscribe() + emit() triggers callbacks instantly
/// 2. Deferred: emit() also queues events for poll() in the app loop
///
/// Both modes work together - callbacks fire immediately, and events
/// are also available for batch processing via poll().
#[derive(Clone, Default)]
pub struct EventBus {
    state: Rc<BusState>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_types", &self.state.subscribers.borrow().len())
            .field("queue_len", &self.state.queue.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Pub/Sub (immediate) ==========

    /// Subscribe to events of type E.
    ///
    /// Callback is invoked synchronously when an E is emitted. Use
    /// `Rc<RefCell<State>>` in the callback for state mutations.
    ///
    /// # Example
    /// ```ignore
    /// let seen = Rc::new(Cell::new(0));
    /// let s = Rc::clone(&seen);
    /// let sub = bus.subscribe::<FrameModified, _>(move |_| s.set(s.get() + 1));
    /// ```
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + 'static,
    {
        let id = SubscriptionId(self.state.next_id.get());
        self.state.next_id.set(id.0 + 1);

        let wrapped: Callback = Rc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.state
            .subscribers
            .borrow_mut()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscriber {
                id,
                active: Rc::new(Cell::new(true)),
                callback: wrapped,
            });
        id
    }

    /// Remove a single subscription. Safe to call from inside the callback
    /// itself; it will not be invoked again. Returns false for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.state.subscribers.borrow_mut();
        for subs in subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                let sub = subs.remove(pos);
                sub.active.set(false);
                return true;
            }
        }
        false
    }

    /// Emit event: invoke callbacks immediately AND queue for deferred processing.
    pub fn emit<E: Event>(&self, event: E) {
        self.state.emit(event);
    }

    /// Emit boxed event (for dynamic dispatch).
    pub fn emit_boxed(&self, event: BoxedEvent) {
        self.state.emit_boxed(event);
    }

    // ========== Deferred Processing ==========

    /// Poll all queued events for batch processing.
    ///
    /// Returns all events emitted since last poll. Use in the app loop:
    /// ```ignore
    /// for event in event_bus.poll() {
    ///     // Process event...
    /// }
    /// ```
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.state.queue.borrow_mut())
    }

    // ========== Handle & Utilities ==========

    /// Get an emitter handle for passing to model entities.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            state: Rc::clone(&self.state),
        }
    }

    /// Clear subscribers for type E
    pub fn unsubscribe_all<E: Event>(&self) {
        if let Some(subs) = self.state.subscribers.borrow_mut().remove(&TypeId::of::<E>()) {
            for sub in subs {
                sub.active.set(false);
            }
        }
    }

    /// Clear all subscribers and queue
    pub fn clear(&self) {
        for (_, subs) in self.state.subscribers.borrow_mut().drain() {
            for sub in subs {
                sub.active.set(false);
            }
        }
        self.state.queue.borrow_mut().clear();
    }

    /// Check if there are subscribers for event type E
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.state
            .subscribers
            .borrow()
            .get(&TypeId::of::<E>())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Check queue length
    pub fn queue_len(&self) -> usize {
        self.state.queue.borrow().len()
    }
}

/// Lightweight emitter handle for model entities.
///
/// Can be cloned and handed to animations/timeline for emitting events.
#[derive(Clone)]
pub struct EventEmitter {
    state: Rc<BusState>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriber_types", &self.state.subscribers.borrow().len())
            .field("queue_len", &self.state.queue.borrow().len())
            .finish()
    }
}

impl EventEmitter {
    /// Emit event: invoke callbacks and queue for deferred processing
    pub fn emit<E: Event>(&self, event: E) {
        self.state.emit(event);
    }

    /// Emit boxed event
    pub fn emit_boxed(&self, event: BoxedEvent) {
        self.state.emit_boxed(event);
    }
}

/// Entity-side event emitter (wraps Option<EventEmitter>)
///
/// Entities built outside a collection (tests, deserialization) start with a
/// dummy emitter and get a real one attached when adopted.
#[derive(Clone, Default, Debug)]
pub struct EntityEmitter {
    inner: Option<EventEmitter>,
}

impl EntityEmitter {
    /// Create a no-op emitter (for entities not yet attached to a bus)
    pub fn dummy() -> Self {
        Self { inner: None }
    }

    /// Create from EventEmitter
    pub fn from_emitter(emitter: EventEmitter) -> Self {
        Self { inner: Some(emitter) }
    }

    /// Whether events actually go anywhere
    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// Emit event (no-op if dummy)
    pub fn emit<E: Event>(&self, event: E) {
        if let Some(ref emitter) = self.inner {
            emitter.emit(event);
        }
    }
}

/// Helper: downcast BoxedEvent to concrete type
///
/// IMPORTANT: Must explicitly deref to `dyn Event` before calling `as_any()`.
/// Without explicit deref, the blanket impl `Event for Box<dyn Event>` intercepts
/// the call and returns `&dyn Any` containing `Box<dyn Event>` instead of the
/// original type, causing downcast to always fail.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
