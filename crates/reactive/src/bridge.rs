//! Stream constructors over external collaborators.
//!
//! `Bridge` is the factory consumers go through to get observables: from a
//! push-notification store, a configuration key, an event bus, or a query
//! served by the subscription pool.
//!
//! | Constructor | First value | Later values |
//! |-------------|-------------|--------------|
//! | `from_store` | current store, on subscribe | every change signal |
//! | `from_config` | current value, on subscribe | every change of the key |
//! | `from_action` | none | every published event |
//! | `from_query` | current result if fetched | every republish |

use crate::observable::{create, Observable, ObservableExt, Observer};
use crate::pool::SubscriptionPool;
use crate::report::ErrorReporter;
use crate::source::{ActionBus, ChangeSource, ConfigStore, ListSelectionSource, SelectionSource};
use crate::subscription::LiveSubscription;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rill_core::{Model, Query, ResultSet, Value};

/// Factory for observables backed by the pool and by external collaborators.
#[derive(Clone)]
pub struct Bridge {
    pool: SubscriptionPool,
    reporter: Rc<dyn ErrorReporter>,
}

impl Bridge {
    /// Creates a bridge over `pool`, sharing its error reporter.
    pub fn new(pool: SubscriptionPool) -> Self {
        let reporter = pool.reporter();
        Self { pool, reporter }
    }

    #[inline]
    pub fn pool(&self) -> &SubscriptionPool {
        &self.pool
    }

    /// Emits the store on subscribe, then again on every change signal.
    pub fn from_store<S>(&self, store: Rc<S>) -> impl Observable<Item = Rc<S>>
    where
        S: ChangeSource + ?Sized + 'static,
    {
        let reporter = Rc::clone(&self.reporter);
        create(move |observer: Observer<Rc<S>>| {
            let emit = {
                let store = Rc::clone(&store);
                let reporter = Rc::clone(&reporter);
                move || observer.deliver(&store, &*reporter, "from_store")
            };
            let registration = store.listen(Box::new(emit.clone()));
            emit();
            registration
        })
    }

    /// Emits the value of `key` on subscribe, then on every change.
    /// Never touches the object store.
    pub fn from_config<C>(&self, config: Rc<C>, key: &str) -> impl Observable<Item = Value>
    where
        C: ConfigStore + ?Sized + 'static,
    {
        let reporter = Rc::clone(&self.reporter);
        let key: Rc<str> = Rc::from(key);
        create(move |observer: Observer<Value>| {
            let registration = {
                let observer = observer.clone();
                let reporter = Rc::clone(&reporter);
                let context = Rc::clone(&key);
                config.on_did_change(
                    &key,
                    Box::new(move |value: &Value| observer.deliver(value, &*reporter, &context)),
                )
            };
            observer.deliver(&config.get(&key), &*reporter, &key);
            registration
        })
    }

    /// Emits events published on `bus` after subscription. No replay.
    pub fn from_action<T, B>(&self, bus: Rc<B>) -> impl Observable<Item = T>
    where
        T: 'static,
        B: ActionBus<T> + ?Sized + 'static,
    {
        let reporter = Rc::clone(&self.reporter);
        create(move |observer: Observer<T>| {
            let reporter = Rc::clone(&reporter);
            bus.listen(Box::new(move |event: &T| {
                observer.deliver(event, &*reporter, "from_action")
            }))
        })
    }

    /// Emits the live result of `query`, shared through the pool.
    pub fn from_query<M: Model>(&self, query: Query<M>) -> impl Observable<Item = ResultSet<M>> {
        let pool = self.pool.clone();
        create(move |observer: Observer<ResultSet<M>>| pool.subscribe(&query, observer))
    }

    /// Emits the live result of a caller-owned subscription registered under
    /// `name`.
    pub fn from_named_query_subscription<M: Model>(
        &self,
        name: &str,
        subscription: Rc<LiveSubscription<M>>,
    ) -> impl Observable<Item = ResultSet<M>> {
        let pool = self.pool.clone();
        let name: String = name.to_string();
        create(move |observer: Observer<ResultSet<M>>| {
            pool.subscribe_named(&name, Rc::clone(&subscription), observer)
        })
    }

    /// Emits the selected items of the store's current data source whenever
    /// the store or that data source changes. Swapping data sources drops the
    /// subscription to the previous one.
    pub fn from_list_selection<S>(
        &self,
        store: Rc<S>,
    ) -> impl Observable<Item = Vec<<S::DataSource as SelectionSource>::Item>>
    where
        S: ListSelectionSource + 'static,
    {
        let bridge = self.clone();
        self.from_store(store).switch_map(move |store: &Rc<S>| {
            bridge
                .from_store(store.data_source())
                .map(|source: &Rc<S::DataSource>| source.selected_items())
        })
    }
}

impl core::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bridge").field("pool", &self.pool).finish()
    }
}
