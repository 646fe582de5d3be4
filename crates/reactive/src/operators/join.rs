//! Combine-latest join operator.

use crate::disposable::Disposable;
use crate::observable::{Observable, Observer};
use alloc::rc::Rc;
use core::cell::RefCell;
use core::marker::PhantomData;

/// Latest value seen on each side.
struct Latest<A, B> {
    left: Option<A>,
    right: Option<B>,
}

/// Combines the latest values of two streams.
///
/// Emits nothing until both sides have emitted at least once, then emits on
/// every emission of either side.
pub struct Join<A, B, F, C> {
    left: A,
    right: B,
    combiner: Rc<F>,
    _output: PhantomData<fn() -> C>,
}

impl<A, B, F, C> Join<A, B, F, C> {
    pub(crate) fn new(left: A, right: B, combiner: F) -> Self {
        Self {
            left,
            right,
            combiner: Rc::new(combiner),
            _output: PhantomData,
        }
    }
}

impl<A, B, F, C> Observable for Join<A, B, F, C>
where
    A: Observable,
    B: Observable,
    A::Item: Clone,
    B::Item: Clone,
    F: Fn(&A::Item, &B::Item) -> C + 'static,
    C: 'static,
{
    type Item = C;

    fn subscribe_observer(&self, observer: Observer<C>) -> Disposable {
        let latest: Rc<RefCell<Latest<A::Item, B::Item>>> = Rc::new(RefCell::new(Latest {
            left: None,
            right: None,
        }));

        let left = {
            let latest = Rc::clone(&latest);
            let combiner = Rc::clone(&self.combiner);
            let observer = observer.clone();
            self.left
                .subscribe_observer(Observer::fallible(move |a: &A::Item| {
                    // Release the borrow before the combiner runs; downstream may re-enter.
                    let right = {
                        let mut latest = latest.borrow_mut();
                        latest.left = Some(a.clone());
                        latest.right.clone()
                    };
                    match right {
                        Some(b) => observer.next(&combiner(a, &b)),
                        None => Ok(()),
                    }
                }))
        };

        let right = {
            let combiner = Rc::clone(&self.combiner);
            self.right
                .subscribe_observer(Observer::fallible(move |b: &B::Item| {
                    let left = {
                        let mut latest = latest.borrow_mut();
                        latest.right = Some(b.clone());
                        latest.left.clone()
                    };
                    match left {
                        Some(a) => observer.next(&combiner(&a, b)),
                        None => Ok(()),
                    }
                }))
        };

        Disposable::from_all([left, right])
    }
}
