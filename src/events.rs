//! Typed publish/subscribe for reader events
//!
//! Subscribers are registered for the lifetime of the returned
//! [`Subscription`]; dropping it removes the callback.

use std::cell::RefCell;
use std::rc::Rc;

type Subscriber<E> = Rc<RefCell<dyn FnMut(&E)>>;

pub struct EventBus<E> {
    subscribers: Rc<RefCell<Vec<Subscriber<E>>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription<E>
    where
        E: 'static,
    {
        let subscriber: Subscriber<E> = Rc::new(RefCell::new(callback));
        self.subscribers.borrow_mut().push(subscriber.clone());
        Subscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    /// Deliver `event` to every subscriber registered at the time of the call.
    pub fn publish(&self, event: &E) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            // A subscriber publishing to its own bus would re-enter here.
            if let Ok(mut callback) = subscriber.try_borrow_mut() {
                (callback)(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// Registration handle; unsubscribes on drop.
pub struct Subscription<E> {
    subscriber: Subscriber<E>,
    subscribers: Rc<RefCell<Vec<Subscriber<E>>>>,
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}

/// Published by the reader after every committed page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub from: usize,
    pub to: usize,
    pub total_pages: usize,
}
