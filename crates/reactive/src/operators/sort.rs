//! Display-name sort operator.

use crate::disposable::Disposable;
use crate::observable::{Observable, Observer};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use icu_collator::{Collator, CollatorOptions};
use rill_core::category::SYSTEM_NAME_MARKER;
use rill_core::Named;

/// Compares display names the way the sidebar lists them.
///
/// Names starting with the system marker sort after every other name. Within
/// each group names are ordered by the root-locale collation (case and
/// accent aware), with the raw code points as the final tie-break so the
/// order is total.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        let collator = match Collator::try_new(&Default::default(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(_err) => {
                debug!(error = ?_err, "collation data unavailable, comparing code points");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let system_a = a.starts_with(SYSTEM_NAME_MARKER);
        let system_b = b.starts_with(SYSTEM_NAME_MARKER);
        system_a
            .cmp(&system_b)
            .then_with(|| match &self.collator {
                Some(collator) => collator.compare(a, b),
                None => a.to_lowercase().cmp(&b.to_lowercase()),
            })
            .then_with(|| a.cmp(b))
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off comparison. Build a `NameCollator` when comparing many names.
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    NameCollator::new().compare(a, b)
}

/// Orders every emitted collection by display name.
pub struct Sort<S> {
    source: S,
    collator: Rc<NameCollator>,
}

impl<S> Sort<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            collator: Rc::new(NameCollator::new()),
        }
    }
}

impl<S, T> Observable for Sort<S>
where
    S: Observable<Item = Vec<T>>,
    T: Named + Clone + 'static,
{
    type Item = Vec<T>;

    fn subscribe_observer(&self, observer: Observer<Vec<T>>) -> Disposable {
        let collator = Rc::clone(&self.collator);
        self.source
            .subscribe_observer(Observer::fallible(move |items: &Vec<T>| {
                let mut sorted = items.clone();
                sorted.sort_by(|a, b| collator.compare(a.display_name(), b.display_name()));
                observer.next(&sorted)
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::{CollectionExt, ObservableExt};
    use crate::subject::Subject;
    use alloc::vec;
    use core::cell::RefCell;

    #[derive(Clone, Debug, PartialEq)]
    struct Entry(&'static str);

    impl Named for Entry {
        fn display_name(&self) -> &str {
            self.0
        }
    }

    fn sorted_names(names: &[&'static str]) -> Vec<&'static str> {
        let subject: Subject<Vec<Entry>> = Subject::new();
        let out = Rc::new(RefCell::new(Vec::<&'static str>::new()));
        let out_clone = out.clone();
        subject.clone().sort().subscribe(move |items| {
            *out_clone.borrow_mut() = items.iter().map(|e| e.0).collect();
        });
        subject.next(&names.iter().map(|n| Entry(*n)).collect::<Vec<_>>());
        let result = out.borrow().clone();
        result
    }

    #[test]
    fn test_system_names_sort_last() {
        assert_eq!(
            sorted_names(&["Inbox", "[System]/All", "Archive"]),
            vec!["Archive", "Inbox", "[System]/All"]
        );
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        assert_eq!(
            sorted_names(&["banana", "Apple", "cherry", "[Gmail]/Spam", "[Gmail]/all mail"]),
            vec!["Apple", "banana", "cherry", "[Gmail]/all mail", "[Gmail]/Spam"]
        );
    }

    #[test]
    fn test_accented_names_sort_with_base_letter() {
        assert_eq!(
            sorted_names(&["Zebra", "Ärger", "École", "apple"]),
            vec!["apple", "Ärger", "École", "Zebra"]
        );
    }

    #[test]
    fn test_compare_display_names_total() {
        let collator = NameCollator::new();
        assert_ne!(collator.compare("Work", "work"), Ordering::Equal);
        assert_eq!(collator.compare("work", "work"), Ordering::Equal);
        assert_eq!(collator.compare("[a", "z"), Ordering::Greater);
        assert_eq!(compare_display_names("Éclair", "Zoo"), Ordering::Less);
    }
}
