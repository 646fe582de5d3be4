//! Ordered listener sets.
//!
//! `ListenerSet` keeps listeners in registration order and hands out IDs for
//! removal. Notification iterates a snapshot taken at the start of the pass,
//! so a listener may add or remove listeners (including itself) while being
//! notified. Listeners removed during the pass are skipped; listeners added
//! during the pass wait for the next one. A failing listener never stops the
//! remaining ones.

use crate::observable::Observer;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use rill_core::Error;

/// Unique identifier for a listener within its set.
pub type ListenerId = u64;

struct Slot<T> {
    id: ListenerId,
    observer: Observer<T>,
    /// Cleared on removal so a pass holding a snapshot skips the slot.
    live: Cell<bool>,
}

/// Listeners in registration order.
pub struct ListenerSet<T> {
    /// Registered listeners
    listeners: RefCell<Vec<Rc<Slot<T>>>>,
    /// Next listener ID to assign
    next_id: Cell<ListenerId>,
}

impl<T: 'static> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ListenerSet<T> {
    /// Creates an empty listener set.
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Appends a listener and returns its ID.
    pub fn insert(&self, observer: Observer<T>) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push(Rc::new(Slot {
            id,
            observer,
            live: Cell::new(true),
        }));
        id
    }

    /// Removes a listener by ID.
    ///
    /// Returns true if the listener was found and removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|slot| slot.id == id) {
            Some(index) => {
                listeners.remove(index).live.set(false);
                true
            }
            None => false,
        }
    }

    /// Returns true if the listener is still registered.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|slot| slot.id == id)
    }

    /// Returns the number of registered listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns true if there are no listeners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Returns all listener IDs in registration order.
    pub fn ids(&self) -> Vec<ListenerId> {
        self.listeners.borrow().iter().map(|slot| slot.id).collect()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        for slot in self.listeners.borrow_mut().drain(..) {
            slot.live.set(false);
        }
    }

    /// Delivers `value` to every listener registered when the pass starts.
    ///
    /// Failures are passed to `on_error` with the failing listener's ID.
    /// Returns the number of listeners that were invoked.
    pub fn notify<E>(&self, value: &T, mut on_error: E) -> usize
    where
        E: FnMut(ListenerId, Error),
    {
        let snapshot: Vec<Rc<Slot<T>>> = self.listeners.borrow().clone();
        let mut delivered = 0;
        for slot in snapshot {
            if !slot.live.get() {
                continue;
            }
            delivered += 1;
            if let Err(err) = slot.observer.next(value) {
                on_error(slot.id, err);
            }
        }
        delivered
    }
}
