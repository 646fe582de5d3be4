//! External collaborator interfaces.
//!
//! The engine never executes queries, loads configuration or stores events
//! itself. Hosts plug those in through the traits below; `rill-store`
//! provides in-memory implementations.

use crate::disposable::Disposable;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use futures::future::LocalBoxFuture;
use rill_core::{ChangeRecord, QueryDescriptor, Record, Result, Value};

/// Pending result of a store query.
pub type FetchFuture = LocalBoxFuture<'static, Result<Vec<Record>>>;

/// Callback invoked with each mutation announced by an object store.
pub type MutationCallback = Box<dyn Fn(&ChangeRecord)>;

/// The persistent object store.
pub trait ObjectStore {
    /// Executes a query. The future resolves once the store has the rows.
    fn run(&self, query: &QueryDescriptor) -> FetchFuture;

    /// Registers a mutation callback.
    fn on_mutation(&self, callback: MutationCallback) -> Disposable;
}

/// Application configuration.
pub trait ConfigStore {
    /// Returns the current value, or `Value::Null` when unset.
    fn get(&self, key: &str) -> Value;

    /// Registers a callback fired with the new value whenever `key` changes.
    fn on_did_change(&self, key: &str, callback: Box<dyn Fn(&Value)>) -> Disposable;
}

/// Fire-and-forget event bus. Listeners see only events published after they
/// registered.
pub trait ActionBus<T> {
    fn listen(&self, callback: Box<dyn Fn(&T)>) -> Disposable;
}

/// A store that signals "something changed" without a payload; listeners read
/// its current state themselves.
pub trait ChangeSource {
    fn listen(&self, callback: Box<dyn Fn()>) -> Disposable;
}

/// A data source that tracks a selection.
pub trait SelectionSource: ChangeSource {
    type Item: Clone + 'static;

    /// Currently selected items, in selection order.
    fn selected_items(&self) -> Vec<Self::Item>;
}

/// A store whose current data source can be swapped at runtime.
pub trait ListSelectionSource: ChangeSource {
    type DataSource: SelectionSource + 'static;

    fn data_source(&self) -> Rc<Self::DataSource>;
}
