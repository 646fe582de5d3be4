//! Filter operator.

use crate::disposable::Disposable;
use crate::observable::{Observable, Observer};
use alloc::rc::Rc;
use alloc::vec::Vec;

/// Re-applies a predicate to every emitted collection.
///
/// Stateless between emissions: each output is computed from the current
/// input only.
pub struct Filter<S, P> {
    source: S,
    predicate: Rc<P>,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Rc::new(predicate),
        }
    }
}

impl<S, T, P> Observable for Filter<S, P>
where
    S: Observable<Item = Vec<T>>,
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    type Item = Vec<T>;

    fn subscribe_observer(&self, observer: Observer<Vec<T>>) -> Disposable {
        let predicate = Rc::clone(&self.predicate);
        self.source
            .subscribe_observer(Observer::fallible(move |items: &Vec<T>| {
                let kept: Vec<T> = items.iter().filter(|item| predicate(item)).cloned().collect();
                observer.next(&kept)
            }))
    }
}

#[cfg(test)]
mod tests {
    use crate::observable::{CollectionExt, ObservableExt};
    use crate::subject::Subject;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[test]
    fn test_filter_each_emission() {
        let subject: Subject<Vec<i32>> = Subject::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        subject
            .clone()
            .filter(|v| v % 2 == 0)
            .subscribe(move |v| seen_clone.borrow_mut().push(v.clone()));

        subject.next(&vec![1, 2, 3, 4]);
        subject.next(&vec![5]);
        subject.next(&vec![6, 8]);

        assert_eq!(*seen.borrow(), vec![vec![2, 4], vec![], vec![6, 8]]);
    }
}
