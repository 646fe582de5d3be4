//! Property-based tests for stream operators using proptest.

use proptest::prelude::*;
use rill_reactive::operators::NameCollator;
use rill_reactive::{CollectionExt, ObservableExt, Subject};
use rill_core::Named;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Clone, Debug)]
struct Entry(String);

impl Named for Entry {
    fn display_name(&self) -> &str {
        &self.0
    }
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][a-z ]{0,6}",
        "\\[[A-Za-z]{1,5}\\]/[A-Za-z ]{0,6}",
    ]
}

fn sorted(names: &[String]) -> Vec<String> {
    let subject: Subject<Vec<Entry>> = Subject::new();
    let out = Rc::new(RefCell::new(Vec::new()));
    let out_clone = out.clone();
    let _handle = subject.clone().sort().subscribe(move |items: &Vec<Entry>| {
        *out_clone.borrow_mut() = items.iter().map(|e| e.0.clone()).collect();
    });
    subject.next(&names.iter().cloned().map(Entry).collect::<Vec<_>>());
    let result = out.borrow().clone();
    result
}

proptest! {
    /// Every system name sorts after every other name.
    #[test]
    fn system_names_sort_last(names in prop::collection::vec(arb_name(), 0..12)) {
        let out = sorted(&names);
        if let Some(first_system) = out.iter().position(|n| n.starts_with('[')) {
            prop_assert!(out[first_system..].iter().all(|n| n.starts_with('[')));
        }
    }

    /// Sorting is a permutation, ordered by the comparison key.
    #[test]
    fn sort_output_is_ordered_permutation(names in prop::collection::vec(arb_name(), 0..12)) {
        let out = sorted(&names);

        let mut expected = names.clone();
        expected.sort();
        let mut actual = out.clone();
        actual.sort();
        prop_assert_eq!(expected, actual);

        let collator = NameCollator::new();
        for pair in out.windows(2) {
            prop_assert_ne!(collator.compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    /// Sorting an already sorted list changes nothing.
    #[test]
    fn sort_is_idempotent(names in prop::collection::vec(arb_name(), 0..12)) {
        let once = sorted(&names);
        prop_assert_eq!(sorted(&once), once.clone());
    }

    /// Case never decides the order of otherwise different names.
    #[test]
    fn case_does_not_decide_order(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        prop_assume!(a != b);
        let collator = NameCollator::new();
        prop_assert_eq!(
            collator.compare(&a.to_uppercase(), &b),
            collator.compare(&a, &b)
        );
    }

    /// Accented letters sort with their base letter, not after `z`.
    #[test]
    fn accented_names_sort_with_base_letter(
        a in "[a-z]{0,5}",
        b in "[a-z]{0,5}",
        accent in prop::sample::select(vec!["ä", "Ä", "á", "à", "å"]),
    ) {
        let collator = NameCollator::new();
        let accented = format!("{}{}", accent, a);
        prop_assert_eq!(collator.compare(&accented, &format!("b{}", b)), Ordering::Less);
        prop_assert_eq!(collator.compare(&accented, &format!("Z{}", b)), Ordering::Less);
    }

    /// Non-system names in any script sort before every system name.
    #[test]
    fn system_marker_outranks_collation(name in "\\PC{1,8}", system in "\\[[a-z]{1,4}\\]") {
        prop_assume!(!name.starts_with('['));
        let collator = NameCollator::new();
        prop_assert_eq!(collator.compare(&name, &system), Ordering::Less);
    }
}
