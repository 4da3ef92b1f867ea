//! Change notification streams.
//!
//! A [`Channel`] is a synchronous, single-threaded publish/subscribe stream.
//! Publishing iterates over a snapshot of the subscriber list, so a handler
//! may subscribe or unsubscribe while an event is being delivered without
//! affecting the current delivery.
//!
//! # Example
//!
//! ```
//! use observa::notify::{Channel, ErrorsChanged};
//!
//! let channel = Channel::new();
//! let id = channel.subscribe(|e: &ErrorsChanged| println!("{} changed", e.property));
//! channel.publish(&ErrorsChanged { property: "Name".into() });
//! assert!(channel.unsubscribe(id));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Fired when a property value changed. `None` means every property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChanged {
    pub property: Option<String>,
}

/// Fired when the error list of a property changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorsChanged {
    pub property: String,
}

/// Handle returned by [`Channel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

struct Subscribers<E> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, Handler<E>)>>,
}

/// A stream of events of type `E`.
///
/// Clones share the same subscriber list.
pub struct Channel<E> {
    inner: Rc<Subscribers<E>>,
}

impl<E> Channel<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Subscribers {
                next_id: Cell::new(0),
                handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Registers `handler` for every subsequent event.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Delivers `event` to the subscribers present when publishing started.
    pub fn publish(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        log::trace!(
            "Publishing {} to {} subscribers",
            std::any::type_name::<E>(),
            snapshot.len()
        );
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// The two streams a binding layer listens to.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    pub property_changed: Channel<PropertyChanged>,
    pub errors_changed: Channel<ErrorsChanged>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to property-changed events.
    pub fn on_property_changed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PropertyChanged) + 'static,
    {
        self.property_changed.subscribe(handler)
    }

    /// Subscribes to errors-changed events.
    pub fn on_errors_changed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ErrorsChanged) + 'static,
    {
        self.errors_changed.subscribe(handler)
    }
}
