//! Event system for tool and pipeline notifications
//!
//! Key principles:
//! - Typed events (an enum per producer) instead of string names
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify handlers interested in a kind)
//! - Polling support: every emitted event is also queued until drained
//!
//! Delivery is synchronous on the calling thread. Producers emit from inside
//! their own update/pointer handlers, so handlers observe events in exactly the
//! order they were produced.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// An event that can be routed by kind
pub trait Event {
    /// Discriminant used for handler registration
    type Kind: Copy + Eq + Hash + std::fmt::Debug;

    /// The kind of this event
    fn kind(&self) -> Self::Kind;
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler<E> {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &E) -> bool;
}

impl<E, F> EventHandler<E> for F
where
    F: FnMut(&E) -> bool,
{
    fn on_event(&mut self, event: &E) -> bool {
        self(event)
    }
}

/// Default number of events kept for polling consumers
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Event bus with kind-based registration and a polling queue
/// Follows chain of responsibility pattern
pub struct EventBus<E: Event> {
    handlers: HashMap<E::Kind, Vec<Box<dyn EventHandler<E>>>>,
    queue: VecDeque<E>,
    capacity: usize,
}

impl<E: Event + Clone> EventBus<E> {
    /// Create a new empty event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create an event bus keeping at most `capacity` undrained events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            handlers: HashMap::new(),
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Register a handler for a specific event kind
    /// Only handlers registered for this kind will be notified
    pub fn register_handler(&mut self, kind: E::Kind, handler: Box<dyn EventHandler<E>>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Deliver an event to its handlers, then queue it for polling
    ///
    /// Stops on the first handler that returns true (consumed). Consumed events
    /// are still queued; consumption only affects handler forwarding.
    pub fn emit(&mut self, event: E) {
        log::trace!("event {:?}", event.kind());
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                if handler.on_event(&event) {
                    break;
                }
            }
        }

        if self.capacity == 0 {
            return;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<E> {
        self.queue.drain(..).collect()
    }

    /// Number of queued, undrained events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Clear all queued events (useful for state transitions)
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<E: Event + Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Clicked(u32),
        Hovered(bool),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Clicked,
        Hovered,
    }

    impl Event for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                Self::Clicked(_) => TestKind::Clicked,
                Self::Hovered(_) => TestKind::Hovered,
            }
        }
    }

    #[test]
    fn test_handlers_only_see_registered_kind() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.register_handler(
            TestKind::Clicked,
            Box::new(move |e: &TestEvent| {
                sink.borrow_mut().push(e.clone());
                false
            }),
        );

        bus.emit(TestEvent::Hovered(true));
        bus.emit(TestEvent::Clicked(42));

        assert_eq!(*seen.borrow(), vec![TestEvent::Clicked(42)]);
        assert_eq!(bus.drain(), vec![TestEvent::Hovered(true), TestEvent::Clicked(42)]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_event_consumption() {
        let mut bus = EventBus::new();
        let second_called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&second_called);

        bus.register_handler(TestKind::Clicked, Box::new(|_: &TestEvent| true));
        bus.register_handler(
            TestKind::Clicked,
            Box::new(move |_: &TestEvent| {
                *flag.borrow_mut() = true;
                false
            }),
        );

        bus.emit(TestEvent::Clicked(1));
        assert!(!*second_called.borrow());
    }

    #[test]
    fn test_queue_capacity_drops_oldest() {
        let mut bus = EventBus::with_capacity(2);
        bus.emit(TestEvent::Clicked(1));
        bus.emit(TestEvent::Clicked(2));
        bus.emit(TestEvent::Clicked(3));
        assert_eq!(bus.drain(), vec![TestEvent::Clicked(2), TestEvent::Clicked(3)]);
    }
}
