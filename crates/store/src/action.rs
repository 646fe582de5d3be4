//! Fire-and-forget event buses.

use alloc::boxed::Box;
use rill_reactive::{ActionBus, Disposable, ObservableExt, Subject};

/// An event bus for one event type. Events are delivered to the listeners
/// present when they are triggered and then forgotten.
pub struct Action<T> {
    listeners: Subject<T>,
}

impl<T: 'static> Default for Action<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Action<T> {
    pub fn new() -> Self {
        Self {
            listeners: Subject::new(),
        }
    }

    /// Publishes an event.
    pub fn trigger(&self, event: T) {
        self.listeners.next(&event);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.observer_count()
    }
}

impl<T: 'static> ActionBus<T> for Action<T> {
    fn listen(&self, callback: Box<dyn Fn(&T)>) -> Disposable {
        self.listeners.subscribe(move |event| callback(event))
    }
}
