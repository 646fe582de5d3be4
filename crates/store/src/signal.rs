//! Push-notification stores.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use rill_reactive::{ChangeSource, Disposable, ListSelectionSource, ObservableExt, SelectionSource, Subject};

/// A store whose only state is a revision counter bumped on every change.
#[derive(Default)]
pub struct SignalStore {
    revision: Cell<u64>,
    changed: Subject<()>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the revision and signals listeners.
    pub fn trigger(&self) {
        self.revision.set(self.revision.get() + 1);
        self.changed.next(&());
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn listener_count(&self) -> usize {
        self.changed.observer_count()
    }
}

impl ChangeSource for SignalStore {
    fn listen(&self, callback: Box<dyn Fn()>) -> Disposable {
        self.changed.subscribe(move |_| callback())
    }
}

/// A list data source with a selection.
pub struct SelectionList<T> {
    selected: RefCell<Vec<T>>,
    changed: Subject<()>,
}

impl<T: Clone + 'static> Default for SelectionList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> SelectionList<T> {
    pub fn new() -> Self {
        Self {
            selected: RefCell::new(Vec::new()),
            changed: Subject::new(),
        }
    }

    /// Replaces the selection and signals listeners.
    pub fn select(&self, items: Vec<T>) {
        *self.selected.borrow_mut() = items;
        self.changed.next(&());
    }

    pub fn listener_count(&self) -> usize {
        self.changed.observer_count()
    }
}

impl<T: Clone + 'static> ChangeSource for SelectionList<T> {
    fn listen(&self, callback: Box<dyn Fn()>) -> Disposable {
        self.changed.subscribe(move |_| callback())
    }
}

impl<T: Clone + 'static> SelectionSource for SelectionList<T> {
    type Item = T;

    fn selected_items(&self) -> Vec<T> {
        self.selected.borrow().clone()
    }
}

/// A store that exposes one `SelectionList` at a time and signals when it
/// is swapped.
pub struct ListSelectionStore<T> {
    data_source: RefCell<Rc<SelectionList<T>>>,
    changed: Subject<()>,
}

impl<T: Clone + 'static> ListSelectionStore<T> {
    pub fn new(data_source: Rc<SelectionList<T>>) -> Self {
        Self {
            data_source: RefCell::new(data_source),
            changed: Subject::new(),
        }
    }

    /// Swaps the current data source and signals listeners.
    pub fn set_data_source(&self, data_source: Rc<SelectionList<T>>) {
        *self.data_source.borrow_mut() = data_source;
        self.changed.next(&());
    }
}

impl<T: Clone + 'static> ChangeSource for ListSelectionStore<T> {
    fn listen(&self, callback: Box<dyn Fn()>) -> Disposable {
        self.changed.subscribe(move |_| callback())
    }
}

impl<T: Clone + 'static> ListSelectionSource for ListSelectionStore<T> {
    type DataSource = SelectionList<T>;

    fn data_source(&self) -> Rc<SelectionList<T>> {
        Rc::clone(&self.data_source.borrow())
    }
}
