//! Single-threaded pub/sub channel carrying raw JSON messages between the
//! hidden frame and everything that listens to it.
//!
//! Frame hosts [`publish`](MessageBus::publish) what the bundler posts;
//! the provider and the frame engine each hold a [`Subscription`]. Dropping
//! a subscription detaches its listener.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

type Listener = Rc<dyn Fn(&Value)>;

#[derive(Default)]
struct BusInner {
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Shared message channel. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Rc<RefCell<BusInner>>,
}

impl MessageBus {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every published message.
    ///
    /// Listeners run in subscription order. The returned handle detaches
    /// the listener when dropped.
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver `message` to every listener attached right now.
    ///
    /// The listener list is snapshotted first, so listeners may publish or
    /// (un)subscribe re-entrantly.
    pub fn publish(&self, message: &Value) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(message);
        }
    }

    /// Parse `json` and publish it. Malformed text is dropped.
    pub fn publish_str(&self, json: &str) {
        match serde_json::from_str::<Value>(json) {
            Ok(message) => self.publish(&message),
            Err(e) => log::debug!("dropping malformed channel message: {e}"),
        }
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// A live listener registration. Carries nothing but the ability to
/// detach.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
}

impl Subscription {
    /// Detach now. Equivalent to dropping.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
