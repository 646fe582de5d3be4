//! Rill Reactive - Live-query subscriptions and composable streams.
//!
//! This crate turns one-shot store queries into continuously updating
//! observable streams, shares identical queries between consumers, and
//! composes streams into derived views.
//!
//! # Core Concepts
//!
//! - `LiveSubscription`: Holds the latest `ResultSet` of one query and refetches on mutation
//! - `SubscriptionPool`: One live subscription per canonical query key, ref-counted by listeners
//! - `Bridge`: Observables from a store, a config key, an event bus or a query
//! - `Observable` / `ObservableExt`: Push streams and their operators (join, filter, sort, map, switch_map)
//! - `Disposable`: Idempotent release handle used at every boundary
//!
//! # Example
//!
//! ```ignore
//! use rill_core::{Folder, Query};
//! use rill_reactive::{Bridge, CollectionExt, ObservableExt, SubscriptionPool};
//!
//! let pool = SubscriptionPool::new(store, Rc::new(executor.spawner()));
//! let bridge = Bridge::new(pool.clone());
//!
//! let handle = bridge
//!     .from_query(Query::<Folder>::all().where_eq("account_id", "a1"))
//!     .map(|rs| rs.items().to_vec())
//!     .sort()
//!     .subscribe(|folders| println!("{} folders", folders.len()));
//!
//! // Store mutations now flow into the stream until:
//! handle.dispose();
//! ```

#![no_std]

extern crate alloc;

#[macro_use]
mod log;

pub mod bridge;
pub mod categories;
pub mod disposable;
pub mod listeners;
pub mod observable;
pub mod operators;
pub mod pool;
pub mod report;
pub mod source;
pub mod subject;
pub mod subscription;

pub use bridge::Bridge;
pub use disposable::{DisposeGuard, Disposable};
pub use listeners::{ListenerId, ListenerSet};
pub use observable::{create, BoxedObservable, CollectionExt, Create, Observable, ObservableExt, Observer};
pub use operators::{Filter, Join, Map, Sort, SwitchMap};
pub use pool::SubscriptionPool;
pub use report::{ErrorReporter, NullReporter, TracingReporter};
pub use source::{
    ActionBus, ChangeSource, ConfigStore, FetchFuture, ListSelectionSource, MutationCallback,
    ObjectStore, SelectionSource,
};
pub use subject::Subject;
pub use subscription::{LiveSubscription, SubscriptionState};

// Re-export commonly used types from dependencies
pub use rill_core::{ChangeRecord, Error, Query, QueryKey, Result, ResultSet};
