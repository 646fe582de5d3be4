//! Hot multicast streams.

use crate::disposable::Disposable;
use crate::listeners::ListenerSet;
use crate::observable::{Observable, Observer};
use crate::report::{ErrorReporter, TracingReporter};
use alloc::rc::Rc;

/// A stream that pushes each value to every current observer.
///
/// Late subscribers see only values emitted after they subscribe. Stores use
/// a `Subject` as their change-notification channel.
pub struct Subject<T> {
    listeners: Rc<ListenerSet<T>>,
    reporter: Rc<dyn ErrorReporter>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
            reporter: Rc::clone(&self.reporter),
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Subject<T> {
    /// Creates a subject that reports listener failures through tracing.
    pub fn new() -> Self {
        Self::with_reporter(Rc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            listeners: Rc::new(ListenerSet::new()),
            reporter,
        }
    }

    /// Pushes a value to every observer, in subscription order.
    pub fn next(&self, value: &T) {
        let reporter = &self.reporter;
        self.listeners.notify(value, |_, err| reporter.report("subject", &err));
    }

    /// Returns the number of current observers.
    pub fn observer_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: 'static> Observable for Subject<T> {
    type Item = T;

    fn subscribe_observer(&self, observer: Observer<T>) -> Disposable {
        let id = self.listeners.insert(observer);
        let listeners = Rc::downgrade(&self.listeners);
        Disposable::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.remove(id);
            }
        })
    }
}
