//! Switch-map (flat-map-latest) operator.

use crate::disposable::Disposable;
use crate::observable::{Observable, Observer};
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::marker::PhantomData;

/// State shared between the upstream listener and the outer handle.
struct Inner {
    current: RefCell<Option<Disposable>>,
    generation: Cell<u64>,
    closed: Cell<bool>,
}

impl Inner {
    fn take_current(&self) -> Option<Disposable> {
        self.current.borrow_mut().take()
    }
}

/// Maps each upstream value to an inner stream and follows only the latest.
///
/// A new upstream value disposes the previous inner subscription before the
/// next one is opened. Disposing the outer handle disposes the upstream and
/// the current inner subscription.
pub struct SwitchMap<S, F, O> {
    source: S,
    project: Rc<F>,
    _inner: PhantomData<fn() -> O>,
}

impl<S, F, O> SwitchMap<S, F, O> {
    pub(crate) fn new(source: S, project: F) -> Self {
        Self {
            source,
            project: Rc::new(project),
            _inner: PhantomData,
        }
    }
}

impl<S, F, O> Observable for SwitchMap<S, F, O>
where
    S: Observable,
    O: Observable,
    F: Fn(&S::Item) -> O + 'static,
{
    type Item = O::Item;

    fn subscribe_observer(&self, observer: Observer<O::Item>) -> Disposable {
        let inner = Rc::new(Inner {
            current: RefCell::new(None),
            generation: Cell::new(0),
            closed: Cell::new(false),
        });

        let upstream = {
            let inner = Rc::clone(&inner);
            let project = Rc::clone(&self.project);
            self.source
                .subscribe_observer(Observer::fallible(move |value: &S::Item| {
                    if inner.closed.get() {
                        return Ok(());
                    }
                    let generation = inner.generation.get() + 1;
                    inner.generation.set(generation);

                    let previous = inner.take_current();
                    if let Some(previous) = previous {
                        previous.dispose();
                    }

                    let handle = project(value).subscribe_observer(observer.clone());

                    // A newer upstream value may have arrived while the inner
                    // stream replayed; that one owns the slot.
                    if inner.closed.get() || inner.generation.get() != generation {
                        handle.dispose();
                    } else {
                        *inner.current.borrow_mut() = Some(handle);
                    }
                    Ok(())
                }))
        };

        Disposable::new(move || {
            inner.closed.set(true);
            upstream.dispose();
            let current = inner.take_current();
            if let Some(current) = current {
                current.dispose();
            }
        })
    }
}
