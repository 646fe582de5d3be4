//! Observable streams.
//!
//! An `Observable` is anything a consumer can subscribe an `Observer` to;
//! subscribing returns the `Disposable` that ends the subscription. Operators
//! are typed wrappers (`Map`, `Join`, `Filter`, `Sort`, `SwitchMap`) that
//! implement the same trait, so they chain without re-wrapping:
//!
//! ```ignore
//! let visible = bridge
//!     .from_query(Query::<Folder>::all())
//!     .map(|folders| folders.items().to_vec())
//!     .sort()
//!     .filter(|f| !f.is_hidden_category());
//! let handle = visible.subscribe(|folders| render(folders));
//! // ...
//! handle.dispose();
//! ```
//!
//! Observables are cold: every subscription runs the producer again and owns
//! whatever upstream subscriptions it opens. Sharing happens below, in the
//! subscription pool.

use crate::disposable::Disposable;
use crate::operators::{Filter, Join, Map, Sort, SwitchMap};
use crate::report::ErrorReporter;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::marker::PhantomData;
use rill_core::{Named, Result};

/// The receiving end of a stream.
///
/// Listeners may fail; a failure travels back to the site that produced the
/// value, which reports it and carries on with the next listener.
pub struct Observer<T> {
    next: Rc<dyn Fn(&T) -> Result<()>>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: Rc::clone(&self.next),
        }
    }
}

impl<T: 'static> Observer<T> {
    /// Creates an observer from an infallible callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self {
            next: Rc::new(move |value: &T| {
                f(value);
                Ok(())
            }),
        }
    }

    /// Creates an observer from a callback that may fail.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<()> + 'static,
    {
        Self { next: Rc::new(f) }
    }

    /// Delivers a value.
    #[inline]
    pub fn next(&self, value: &T) -> Result<()> {
        (self.next)(value)
    }

    /// Delivers a value, reporting a failure instead of returning it.
    pub(crate) fn deliver(&self, value: &T, reporter: &dyn ErrorReporter, context: &str) {
        if let Err(err) = self.next(value) {
            reporter.report(context, &err);
        }
    }
}

/// A push stream of values.
pub trait Observable {
    type Item: 'static;

    /// Subscribes an observer. Disposing the returned handle ends the
    /// subscription and releases every upstream subscription it opened.
    fn subscribe_observer(&self, observer: Observer<Self::Item>) -> Disposable;
}

/// Subscription shorthands and operators available on every observable.
pub trait ObservableExt: Observable + Sized {
    /// Subscribes an infallible callback.
    fn subscribe<F>(&self, f: F) -> Disposable
    where
        F: Fn(&Self::Item) + 'static,
    {
        self.subscribe_observer(Observer::new(f))
    }

    /// Subscribes a callback that may fail.
    fn try_subscribe<F>(&self, f: F) -> Disposable
    where
        F: Fn(&Self::Item) -> Result<()> + 'static,
    {
        self.subscribe_observer(Observer::fallible(f))
    }

    /// Transforms every value.
    fn map<U, F>(self, f: F) -> Map<Self, F, U>
    where
        F: Fn(&Self::Item) -> U + 'static,
        U: 'static,
    {
        Map::new(self, f)
    }

    /// Combines the latest values of two streams (combine-latest).
    fn join<B, F, C>(self, other: B, combiner: F) -> Join<Self, B, F, C>
    where
        B: Observable,
        F: Fn(&Self::Item, &B::Item) -> C + 'static,
        C: 'static,
    {
        Join::new(self, other, combiner)
    }

    /// Follows the stream produced from the latest value only.
    fn switch_map<O, F>(self, f: F) -> SwitchMap<Self, F, O>
    where
        O: Observable,
        F: Fn(&Self::Item) -> O + 'static,
    {
        SwitchMap::new(self, f)
    }

    /// Erases the concrete operator type.
    fn boxed(self) -> BoxedObservable<Self::Item>
    where
        Self: 'static,
    {
        BoxedObservable(Rc::new(self))
    }
}

impl<O: Observable> ObservableExt for O {}

/// Operators for streams of collections.
pub trait CollectionExt<T>: Observable<Item = Vec<T>> + Sized {
    /// Keeps the elements matching `predicate` in every emitted collection.
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: Fn(&T) -> bool + 'static,
    {
        Filter::new(self, predicate)
    }

    /// Orders every emitted collection by display name.
    fn sort(self) -> Sort<Self>
    where
        T: Named + Clone,
    {
        Sort::new(self)
    }
}

impl<T, O: Observable<Item = Vec<T>>> CollectionExt<T> for O {}

/// A type-erased, cheaply clonable observable.
pub struct BoxedObservable<T>(Rc<dyn Observable<Item = T>>);

impl<T> Clone for BoxedObservable<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: 'static> Observable for BoxedObservable<T> {
    type Item = T;

    fn subscribe_observer(&self, observer: Observer<T>) -> Disposable {
        self.0.subscribe_observer(observer)
    }
}

/// An observable backed by a subscribe function.
pub struct Create<T, F> {
    subscribe: F,
    _item: PhantomData<fn() -> T>,
}

/// Creates an observable whose subscriptions run `subscribe`.
pub fn create<T, F>(subscribe: F) -> Create<T, F>
where
    T: 'static,
    F: Fn(Observer<T>) -> Disposable,
{
    Create {
        subscribe,
        _item: PhantomData,
    }
}

impl<T, F> Observable for Create<T, F>
where
    T: 'static,
    F: Fn(Observer<T>) -> Disposable,
{
    type Item = T;

    fn subscribe_observer(&self, observer: Observer<T>) -> Disposable {
        (self.subscribe)(observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Subject;
    use alloc::vec;
    use core::cell::RefCell;
    use rill_core::Error;

    #[test]
    fn test_create_runs_per_subscription() {
        let runs = Rc::new(RefCell::new(0));
        let runs_clone = runs.clone();
        let source = create(move |observer: Observer<i32>| {
            *runs_clone.borrow_mut() += 1;
            let _ = observer.next(&42);
            Disposable::empty()
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        source.subscribe(move |v| seen_clone.borrow_mut().push(*v));
        source.subscribe(|_| {});

        assert_eq!(*runs.borrow(), 2);
        assert_eq!(*seen.borrow(), vec![42]);
    }

    #[test]
    fn test_try_subscribe_returns_failure_to_producer() {
        let result = Rc::new(RefCell::new(None));
        let result_clone = result.clone();
        let source = create(move |observer: Observer<i32>| {
            *result_clone.borrow_mut() = Some(observer.next(&1));
            Disposable::empty()
        });

        source.try_subscribe(|_| Err(Error::listener("rejected")));

        assert_eq!(*result.borrow(), Some(Err(Error::listener("rejected"))));
    }

    #[test]
    fn test_boxed_observable_forwards() {
        let subject: Subject<i32> = Subject::new();
        let boxed = subject.clone().map(|v| v * 2).boxed();
        let copy = boxed.clone();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let handle = copy.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        subject.next(&5);
        handle.dispose();
        subject.next(&6);

        assert_eq!(*seen.borrow(), vec![10]);
    }
}
