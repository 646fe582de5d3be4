//! Derived stream operators.
//!
//! Each operator is a typed wrapper implementing `Observable`:
//! - Map: transforms every value
//! - Join: combine-latest over two streams
//! - Filter: keeps matching elements of every emitted collection
//! - Sort: orders every emitted collection by display name
//! - SwitchMap: follows the inner stream built from the latest value
//!
//! Operators only see values emitted by their upstream and never touch a
//! store. Subscribing to a wrapper subscribes its upstreams; disposing the
//! returned handle disposes them.

mod filter;
mod join;
mod map;
mod sort;
mod switch;

pub use filter::Filter;
pub use join::Join;
pub use map::Map;
pub use sort::{compare_display_names, NameCollator, Sort};
pub use switch::SwitchMap;

use crate::observable::{CollectionExt, Observable, ObservableExt};
use alloc::vec::Vec;
use rill_core::Named;

/// Combines the latest values of `a` and `b` with `combiner`.
pub fn join<A, B, F, C>(a: A, b: B, combiner: F) -> Join<A, B, F, C>
where
    A: Observable,
    B: Observable,
    F: Fn(&A::Item, &B::Item) -> C + 'static,
    C: 'static,
{
    a.join(b, combiner)
}

/// Keeps the elements of every emitted collection that match `predicate`.
pub fn filter<S, T, P>(source: S, predicate: P) -> Filter<S, P>
where
    S: Observable<Item = Vec<T>>,
    P: Fn(&T) -> bool + 'static,
{
    source.filter(predicate)
}

/// Orders every emitted collection by display name.
pub fn sort<S, T>(source: S) -> Sort<S>
where
    S: Observable<Item = Vec<T>>,
    T: Named + Clone,
{
    source.sort()
}

pub fn map<S, F, U>(source: S, f: F) -> Map<S, F, U>
where
    S: Observable,
    F: Fn(&S::Item) -> U + 'static,
    U: 'static,
{
    source.map(f)
}

pub fn switch_map<S, F, O>(source: S, f: F) -> SwitchMap<S, F, O>
where
    S: Observable,
    O: Observable,
    F: Fn(&S::Item) -> O + 'static,
{
    source.switch_map(f)
}
