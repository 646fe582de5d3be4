//! Map operator.

use crate::disposable::Disposable;
use crate::observable::{Observable, Observer};
use alloc::rc::Rc;
use core::marker::PhantomData;

/// Transforms every upstream value with a mapper function.
pub struct Map<S, F, U> {
    source: S,
    mapper: Rc<F>,
    _output: PhantomData<fn() -> U>,
}

impl<S, F, U> Map<S, F, U> {
    pub(crate) fn new(source: S, mapper: F) -> Self {
        Self {
            source,
            mapper: Rc::new(mapper),
            _output: PhantomData,
        }
    }
}

impl<S, F, U> Observable for Map<S, F, U>
where
    S: Observable,
    F: Fn(&S::Item) -> U + 'static,
    U: 'static,
{
    type Item = U;

    fn subscribe_observer(&self, observer: Observer<U>) -> Disposable {
        let mapper = Rc::clone(&self.mapper);
        self.source
            .subscribe_observer(Observer::fallible(move |value: &S::Item| {
                observer.next(&mapper(value))
            }))
    }
}
