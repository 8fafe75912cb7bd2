//! Per-store event fan-out
//!
//! Each store owns one `EventBus` for its own event type. Observers subscribe
//! with a shared `Rc` and are keyed by its identity, exactly like processors on
//! the [`Dispatcher`](crate::Dispatcher): re-subscribing overwrites, emitting
//! works on a snapshot, and dropped listeners are skipped.

use crate::action::Event;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receives events from an [`EventBus`]
pub trait EventListener<E: Event> {
    fn on_event(&self, event: &E);
}

/// Identity of a subscribed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Identity of the allocation behind `listener`
    pub fn of<L: ?Sized>(listener: &Rc<L>) -> Self {
        Self(Rc::as_ptr(listener) as *const () as usize)
    }
}

struct Subscription<E: Event> {
    id: ListenerId,
    listener: Weak<dyn EventListener<E>>,
}

/// Fans events of type `E` out to subscribed listeners
pub struct EventBus<E: Event> {
    subscriptions: RefCell<Vec<Subscription<E>>>,
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe `listener`, replacing any earlier subscription of it
    pub fn subscribe<L>(&self, listener: &Rc<L>) -> ListenerId
    where
        L: EventListener<E> + 'static,
    {
        let id = ListenerId::of(listener);
        let weak: Weak<L> = Rc::downgrade(listener);
        let weak: Weak<dyn EventListener<E>> = weak;

        let mut subscriptions = self.subscriptions.borrow_mut();
        subscriptions.retain(|s| s.listener.strong_count() > 0);
        match subscriptions.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.listener = weak,
            None => subscriptions.push(Subscription { id, listener: weak }),
        }
        id
    }

    /// Remove `id`; unknown listeners are ignored
    pub fn unsubscribe(&self, id: ListenerId) {
        self.subscriptions.borrow_mut().retain(|s| s.id != id);
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.subscriptions
            .borrow()
            .iter()
            .any(|s| s.id == id && s.listener.strong_count() > 0)
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.listener.strong_count() > 0)
            .count()
    }

    /// Deliver `event` to every current listener before returning
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Rc<dyn EventListener<E>>> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            subscriptions.retain(|s| s.listener.strong_count() > 0);
            subscriptions
                .iter()
                .filter_map(|s| s.listener.upgrade())
                .collect()
        };

        log::trace!("EventBus: {:?} -> {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener.on_event(event);
        }
    }
}
