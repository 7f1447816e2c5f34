//! A single mutable value with synchronously notified listeners.
//!
//! `ReactiveCell` is the leaf of the reactive model: state hooks store their
//! value in one, and anything that reads a cell while a render is active is
//! subscribed to it. Writes are change-gated by `PartialEq` and notify a
//! snapshot of the listener list, so a listener that subscribes or
//! unsubscribes mid-notification does not affect the dispatch pass already
//! in flight.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::context;
use crate::instance::{ComponentInstance, InstanceId};

pub type ListenerId = u64;

struct ListenerEntry {
    id: ListenerId,
    /// Set when this listener stands for a component instance subscription,
    /// used to keep one subscription per instance per cell.
    owner: Option<InstanceId>,
    callback: Rc<dyn Fn()>,
}

struct CellInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<ListenerEntry>>,
    next_listener_id: Cell<ListenerId>,
}

pub struct ReactiveCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for ReactiveCell<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for ReactiveCell<T> {}

impl<T: 'static> ReactiveCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
            }),
        }
    }

    /// Runs `f` against the current value without subscribing anything.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.borrow();
        f(&value)
    }

    /// Registers a listener notified synchronously on every observed change.
    /// Listeners persist across writes until explicitly unsubscribed.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> ListenerId {
        self.push_listener(None, Rc::new(callback))
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|entry| entry.id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn push_listener(&self, owner: Option<InstanceId>, callback: Rc<dyn Fn()>) -> ListenerId {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            id,
            owner,
            callback,
        });
        id
    }

    /// Subscribes `instance` so that future changes schedule it for
    /// re-render. At most one subscription per instance is kept.
    pub(crate) fn subscribe_instance(&self, instance: &Rc<ComponentInstance>) {
        let owner = instance.id();
        {
            let listeners = self.inner.listeners.borrow();
            if listeners.iter().any(|entry| entry.owner == Some(owner)) {
                return;
            }
        }
        let weak = Rc::downgrade(instance);
        self.push_listener(
            Some(owner),
            Rc::new(move || {
                if let Some(instance) = weak.upgrade() {
                    instance.schedule_rerender();
                }
            }),
        );
    }

    fn notify(&self) {
        // Snapshot before invoking so re-entrant subscribe/unsubscribe calls
        // cannot disturb the current dispatch pass. Listeners run to
        // completion, in registration order.
        let snapshot: Vec<Rc<dyn Fn()>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.callback))
            .collect();
        for callback in snapshot {
            callback();
        }
    }
}

impl<T: Clone + 'static> ReactiveCell<T> {
    /// Returns the current value. When a render context is active, the
    /// current component instance is subscribed to this cell.
    pub fn read(&self) -> T {
        if let Some(instance) = context::active_instance() {
            self.subscribe_instance(&instance);
        }
        self.inner.value.borrow().clone()
    }
}

impl<T: PartialEq + 'static> ReactiveCell<T> {
    /// Replaces the value. Listeners are notified only when the new value
    /// differs from the prior one; returns whether a change was observed.
    pub fn write(&self, next: T) -> bool {
        {
            let mut value = self.inner.value.borrow_mut();
            if *value == next {
                return false;
            }
            *value = next;
        }
        self.notify();
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}
