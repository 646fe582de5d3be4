//! The subscription pool.
//!
//! `SubscriptionPool` maps canonical query keys to live subscriptions so that
//! every consumer of the same query shares one subscription and one fetch.
//! Each entry counts the listeners attached through its key; the disposable
//! returned for the entry's last listener removes the entry. A subscription
//! is disposed once its last listener is gone, and a later request for the
//! same key builds a fresh instance. An entry whose subscription was
//! disposed directly counts as absent.
//!
//! The pool is an explicitly constructed service. It registers itself with
//! the object store's mutation channel on construction and detaches on
//! `shutdown()` or drop.
//!
//! # Example
//!
//! ```ignore
//! let pool = SubscriptionPool::new(store.clone(), Rc::new(executor.spawner()));
//! let inbox = Query::<Folder>::all().where_eq("role", "inbox");
//!
//! let a = pool.subscribe(&inbox, Observer::new(|rs| render(rs)));
//! let b = pool.subscribe(&inbox.clone(), Observer::new(|rs| badge(rs)));
//! assert_eq!(pool.subscription_count(), 1);
//!
//! a.dispose();
//! b.dispose(); // last listener: subscription destroyed
//! assert_eq!(pool.subscription_count(), 0);
//! ```

use crate::disposable::Disposable;
use crate::observable::Observer;
use crate::report::{ErrorReporter, TracingReporter};
use crate::source::ObjectStore;
use crate::subscription::{LiveSubscription, PooledSubscription};
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use futures::task::LocalSpawn;
use hashbrown::HashMap;
use rill_core::{ChangeRecord, Error, Model, Query, QueryKey, ResultSet};

/// Key of a pool entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum PoolKey {
    /// Deduplicated by canonical query key.
    Query(QueryKey),
    /// Registered by the caller under an explicit name.
    Named(String),
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKey::Query(key) => write!(f, "{}", key),
            PoolKey::Named(name) => write!(f, "named:{}", name),
        }
    }
}

type Entry = Rc<dyn PooledSubscription>;

fn same_subscription(a: &Entry, b: &Entry) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// A subscription and the number of listeners attached under one key.
struct PoolEntry {
    subscription: Entry,
    refs: usize,
}

impl PoolEntry {
    fn new(subscription: Entry) -> Self {
        Self { subscription, refs: 0 }
    }

    #[inline]
    fn is_live(&self) -> bool {
        !self.subscription.is_disposed()
    }
}

struct PoolInner {
    store: Rc<dyn ObjectStore>,
    spawner: Rc<dyn LocalSpawn>,
    reporter: Rc<dyn ErrorReporter>,
    entries: RefCell<HashMap<PoolKey, PoolEntry>>,
    /// Registration with the store's mutation channel.
    store_listener: RefCell<Option<Disposable>>,
    shut_down: Cell<bool>,
}

impl PoolInner {
    fn notify_mutation(&self, change: &ChangeRecord) {
        // Snapshot first: subscriptions may publish synchronously and
        // listeners may subscribe or dispose while we iterate.
        let targets: Vec<Entry> = self
            .entries
            .borrow()
            .values()
            .filter(|entry| entry.is_live() && entry.subscription.entity_type() == change.entity_type)
            .map(|entry| Rc::clone(&entry.subscription))
            .collect();
        trace!(
            entity_type = %change.entity_type,
            matched = targets.len(),
            "routing mutation"
        );
        for target in targets {
            target.on_mutation(change);
        }
    }

    /// Drops one reference from the entry under `key` if it still holds
    /// `subscription`, removing the entry at zero. The subscription itself
    /// is disposed once it has no listeners left.
    fn release(&self, key: &PoolKey, subscription: &Entry, remaining_listeners: usize) {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let drained = match entries.get_mut(key) {
                Some(entry) if same_subscription(&entry.subscription, subscription) => {
                    entry.refs = entry.refs.saturating_sub(1);
                    entry.refs == 0
                }
                _ => false,
            };
            if drained {
                entries.remove(key)
            } else {
                None
            }
        };
        if removed.is_some() {
            debug!(key = %key, "pool entry released");
        }
        if remaining_listeners == 0 {
            subscription.dispose();
        }
    }

    /// Adds one reference to the entry under `key` if it holds
    /// `subscription`.
    fn retain(&self, key: &PoolKey, subscription: &Entry) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(key) {
            if same_subscription(&entry.subscription, subscription) {
                entry.refs += 1;
            }
        }
    }

    fn detach_store(&self) {
        let listener = self.store_listener.borrow_mut().take();
        if let Some(listener) = listener {
            listener.dispose();
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.detach_store();
    }
}

/// Process-wide registry of live subscriptions, one per query key.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct SubscriptionPool {
    inner: Rc<PoolInner>,
}

impl SubscriptionPool {
    /// Creates a pool that reports errors through `tracing`.
    pub fn new(store: Rc<dyn ObjectStore>, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self::with_reporter(store, spawner, Rc::new(TracingReporter))
    }

    /// Creates a pool with an explicit error reporter.
    pub fn with_reporter(
        store: Rc<dyn ObjectStore>,
        spawner: Rc<dyn LocalSpawn>,
        reporter: Rc<dyn ErrorReporter>,
    ) -> Self {
        let inner = Rc::new(PoolInner {
            store,
            spawner,
            reporter,
            entries: RefCell::new(HashMap::new()),
            store_listener: RefCell::new(None),
            shut_down: Cell::new(false),
        });

        let weak: Weak<PoolInner> = Rc::downgrade(&inner);
        let listener = inner.store.on_mutation(Box::new(move |change: &ChangeRecord| {
            if let Some(inner) = weak.upgrade() {
                inner.notify_mutation(change);
            }
        }));
        *inner.store_listener.borrow_mut() = Some(listener);

        Self { inner }
    }

    /// Subscribes `observer` to the live result of `query`.
    ///
    /// Structurally equal queries share one subscription. The returned
    /// disposable removes the observer; disposing the last one destroys the
    /// subscription.
    ///
    /// # Panics
    ///
    /// Panics if the query key is already held by a subscription of another
    /// model type. That can only happen when two models declare the same
    /// entity type.
    pub fn subscribe<M: Model>(&self, query: &Query<M>, observer: Observer<ResultSet<M>>) -> Disposable {
        if self.inner.shut_down.get() {
            self.report_shut_down(query.canonical_key().as_str());
            return Disposable::empty();
        }

        let key = PoolKey::Query(query.canonical_key());
        let existing = self
            .inner
            .entries
            .borrow()
            .get(&key)
            .filter(|entry| entry.is_live())
            .map(|entry| Rc::clone(&entry.subscription));
        let subscription = match existing {
            Some(entry) => match entry.into_any().downcast::<LiveSubscription<M>>() {
                Ok(subscription) => subscription,
                Err(_) => panic!(
                    "pool key `{}` is held by a subscription of another model type",
                    key
                ),
            },
            None => {
                let subscription = self.create_subscription(query);
                // Replaces a stale entry whose subscription was disposed directly.
                self.inner
                    .entries
                    .borrow_mut()
                    .insert(key.clone(), PoolEntry::new(subscription.clone()));
                debug!(key = %key, "pool entry created");
                subscription
            }
        };

        self.attach(key, subscription, observer)
    }

    /// Registers a caller-constructed subscription under an explicit name,
    /// bypassing key deduplication, and subscribes `observer` to it.
    ///
    /// Repeated calls with the same name and the same instance share it; the
    /// disposal contract is the same as `subscribe`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered with a different instance.
    pub fn subscribe_named<M: Model>(
        &self,
        name: &str,
        subscription: Rc<LiveSubscription<M>>,
        observer: Observer<ResultSet<M>>,
    ) -> Disposable {
        if self.inner.shut_down.get() {
            self.report_shut_down(name);
            return Disposable::empty();
        }

        let key = PoolKey::Named(name.to_string());
        let erased: Entry = subscription.clone();
        let existing = self
            .inner
            .entries
            .borrow()
            .get(&key)
            .filter(|entry| entry.is_live())
            .map(|entry| Rc::clone(&entry.subscription));
        match existing {
            Some(current) => {
                if !same_subscription(&current, &erased) {
                    panic!(
                        "named subscription `{}` is already registered with a different instance",
                        name
                    );
                }
            }
            None => {
                if subscription.is_disposed() {
                    self.inner.entries.borrow_mut().remove(&key);
                    self.inner
                        .reporter
                        .report(name, &Error::subscription_disposed(name));
                    return Disposable::empty();
                }
                self.inner
                    .entries
                    .borrow_mut()
                    .insert(key.clone(), PoolEntry::new(erased));
                debug!(key = %key, "named pool entry created");
            }
        }

        self.attach(key, subscription, observer)
    }

    /// Routes a store mutation to every subscription of the same entity type.
    pub fn notify_mutation(&self, change: &ChangeRecord) {
        self.inner.notify_mutation(change);
    }

    fn attach<M: Model>(
        &self,
        key: PoolKey,
        subscription: Rc<LiveSubscription<M>>,
        observer: Observer<ResultSet<M>>,
    ) -> Disposable {
        let erased: Entry = subscription.clone();
        // Counted before the listener is added; a replay may release other
        // references to this entry.
        self.inner.retain(&key, &erased);
        let id = match subscription.add_listener(observer) {
            Some(id) => id,
            None => {
                self.inner.release(&key, &erased, subscription.listener_count());
                let name = key.to_string();
                self.inner
                    .reporter
                    .report(&name, &Error::subscription_disposed(name.as_str()));
                return Disposable::empty();
            }
        };

        let pool = Rc::downgrade(&self.inner);
        Disposable::new(move || {
            let remaining = subscription.remove_listener(id);
            match pool.upgrade() {
                Some(pool) => pool.release(&key, &erased, remaining),
                None if remaining == 0 => erased.dispose(),
                None => {}
            }
        })
    }

    fn report_shut_down(&self, context: &str) {
        self.inner
            .reporter
            .report(context, &Error::invalid_operation("subscription pool is shut down"));
    }

    /// Creates a subscription bound to this pool's store, spawner and
    /// reporter without registering it. Used with `subscribe_named`.
    pub fn create_subscription<M: Model>(&self, query: &Query<M>) -> Rc<LiveSubscription<M>> {
        LiveSubscription::new(
            query,
            Rc::clone(&self.inner.store),
            Rc::clone(&self.inner.spawner),
            Rc::clone(&self.inner.reporter),
        )
    }

    fn live_entry(&self, key: &PoolKey) -> Option<Entry> {
        self.inner
            .entries
            .borrow()
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| Rc::clone(&entry.subscription))
    }

    /// Returns the number of live pool entries.
    pub fn subscription_count(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .values()
            .filter(|entry| entry.is_live())
            .count()
    }

    /// Returns true if a subscription for `query` is live.
    pub fn contains<M: Model>(&self, query: &Query<M>) -> bool {
        self.live_entry(&PoolKey::Query(query.canonical_key())).is_some()
    }

    /// Returns true if a live subscription is registered under `name`.
    pub fn contains_named(&self, name: &str) -> bool {
        self.live_entry(&PoolKey::Named(name.to_string())).is_some()
    }

    /// Returns the number of listeners attached through the entry for
    /// `query`, or 0.
    pub fn ref_count<M: Model>(&self, query: &Query<M>) -> usize {
        self.inner
            .entries
            .borrow()
            .get(&PoolKey::Query(query.canonical_key()))
            .filter(|entry| entry.is_live())
            .map_or(0, |entry| entry.refs)
    }

    /// Returns the live subscription serving `query`, if any.
    pub fn subscription_for<M: Model>(&self, query: &Query<M>) -> Option<Rc<LiveSubscription<M>>> {
        let entry = self.live_entry(&PoolKey::Query(query.canonical_key()))?;
        entry.into_any().downcast::<LiveSubscription<M>>().ok()
    }

    pub fn reporter(&self) -> Rc<dyn ErrorReporter> {
        Rc::clone(&self.inner.reporter)
    }

    /// Detaches from the store and disposes every live subscription.
    /// Idempotent. Later subscribe calls are reported and return an empty
    /// disposable.
    pub fn shutdown(&self) {
        if self.inner.shut_down.replace(true) {
            return;
        }
        self.inner.detach_store();
        let entries: Vec<Entry> = self
            .inner
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry.subscription)
            .collect();
        debug!(disposed = entries.len(), "subscription pool shut down");
        for entry in entries {
            entry.dispose();
        }
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.get()
    }
}

impl fmt::Debug for SubscriptionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionPool")
            .field("subscriptions", &self.subscription_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::RecordingReporter;
    use crate::source::{FetchFuture, MutationCallback};
    use crate::subject::Subject;
    use alloc::vec;
    use futures::executor::LocalPool;
    use futures::future::FutureExt;
    use rill_core::{Folder, Label, QueryDescriptor, Record};

    /// Empty store with a working mutation channel.
    #[derive(Default)]
    struct EmptyStore {
        mutations: Subject<ChangeRecord>,
        runs: Cell<usize>,
    }

    impl ObjectStore for EmptyStore {
        fn run(&self, _query: &QueryDescriptor) -> FetchFuture {
            self.runs.set(self.runs.get() + 1);
            async { Ok(Vec::<Record>::new()) }.boxed_local()
        }

        fn on_mutation(&self, callback: MutationCallback) -> Disposable {
            use crate::observable::ObservableExt;
            self.mutations.subscribe(move |change| callback(change))
        }
    }

    fn fixture() -> (LocalPool, Rc<EmptyStore>, Rc<RecordingReporter>, SubscriptionPool) {
        let executor = LocalPool::new();
        let store = Rc::new(EmptyStore::default());
        let reporter = Rc::new(RecordingReporter::default());
        let pool = SubscriptionPool::with_reporter(
            store.clone(),
            Rc::new(executor.spawner()),
            reporter.clone(),
        );
        (executor, store, reporter, pool)
    }

    #[test]
    fn test_equal_queries_share_subscription() {
        let (mut executor, store, _, pool) = fixture();
        let a = Query::<Folder>::all().where_eq("account_id", "a1").where_eq("role", "inbox");
        let b = Query::<Folder>::all().where_eq("role", "inbox").where_eq("account_id", "a1");

        let _h1 = pool.subscribe(&a, Observer::new(|_| {}));
        let _h2 = pool.subscribe(&b, Observer::new(|_| {}));
        executor.run_until_stalled();

        assert_eq!(pool.subscription_count(), 1);
        assert_eq!(pool.ref_count(&a), 2);
        assert_eq!(store.runs.get(), 1);
    }

    #[test]
    fn test_last_dispose_removes_entry() {
        let (_, _, _, pool) = fixture();
        let query = Query::<Folder>::all();

        let h1 = pool.subscribe(&query, Observer::new(|_| {}));
        let h2 = pool.subscribe(&query, Observer::new(|_| {}));
        let first = pool.subscription_for(&query);

        h1.dispose();
        h1.dispose();
        assert!(pool.contains(&query));
        assert_eq!(pool.ref_count(&query), 1);

        h2.dispose();
        assert!(!pool.contains(&query));
        assert!(first.map_or(false, |s| s.is_disposed()));
    }

    #[test]
    fn test_mutation_routed_by_entity_type() {
        let (mut executor, store, _, pool) = fixture();
        let folders = Query::<Folder>::all();
        let labels = Query::<Label>::all();
        let _f = pool.subscribe(&folders, Observer::new(|_| {}));
        let _l = pool.subscribe(&labels, Observer::new(|_| {}));
        executor.run_until_stalled();

        store.mutations.next(&ChangeRecord::insert("label", vec![1]));
        executor.run_until_stalled();

        assert_eq!(pool.subscription_for(&folders).map(|s| s.fetch_count()), Some(1));
        assert_eq!(pool.subscription_for(&labels).map(|s| s.fetch_count()), Some(2));
    }

    #[test]
    fn test_named_subscription_bypasses_dedup() {
        let (_, _, _, pool) = fixture();
        let query = Query::<Folder>::all();
        let owned = pool.create_subscription(&query);

        let h1 = pool.subscribe_named("sidebar", owned.clone(), Observer::new(|_| {}));
        let h2 = pool.subscribe(&query, Observer::new(|_| {}));
        let h3 = pool.subscribe_named("sidebar", owned.clone(), Observer::new(|_| {}));

        assert_eq!(pool.subscription_count(), 2);
        assert_eq!(owned.listener_count(), 2);

        h1.dispose();
        h3.dispose();
        assert!(owned.is_disposed());
        assert!(!pool.contains_named("sidebar"));
        h2.dispose();
    }

    #[test]
    #[should_panic(expected = "already registered with a different instance")]
    fn test_named_collision_panics() {
        let (_, _, _, pool) = fixture();
        let query = Query::<Folder>::all();
        let _h = pool.subscribe_named("x", pool.create_subscription(&query), Observer::new(|_| {}));
        let _ = pool.subscribe_named("x", pool.create_subscription(&query), Observer::new(|_| {}));
    }

    #[test]
    fn test_disposed_named_subscription_is_reported() {
        let (_, _, reporter, pool) = fixture();
        let owned = pool.create_subscription(&Query::<Folder>::all());
        owned.dispose();

        let handle = pool.subscribe_named("gone", owned, Observer::new(|_| {}));

        assert!(handle.is_disposed());
        assert_eq!(
            *reporter.reports.borrow(),
            vec![(String::from("gone"), Error::subscription_disposed("gone"))]
        );
    }

    #[test]
    fn test_shutdown_disposes_everything() {
        let (mut executor, store, reporter, pool) = fixture();
        let query = Query::<Folder>::all();
        let handle = pool.subscribe(&query, Observer::new(|_| {}));
        let subscription = pool.subscription_for(&query);
        executor.run_until_stalled();

        pool.shutdown();
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert_eq!(pool.subscription_count(), 0);
        assert_eq!(store.mutations.observer_count(), 0);
        assert!(subscription.map_or(false, |s| s.is_disposed()));

        handle.dispose();
        let late = pool.subscribe(&query, Observer::new(|_| {}));
        assert!(late.is_disposed());
        assert_eq!(reporter.reports.borrow().len(), 1);
    }

    #[test]
    fn test_directly_disposed_subscription_is_replaced() {
        let (mut executor, store, reporter, pool) = fixture();
        let query = Query::<Folder>::all();
        let first = pool.subscribe(&query, Observer::new(|_| {}));
        executor.run_until_stalled();
        let stale = pool.subscription_for(&query);
        if let Some(stale) = &stale {
            stale.dispose();
        }

        assert!(!pool.contains(&query));
        assert_eq!(pool.subscription_count(), 0);

        let deliveries = Rc::new(Cell::new(0));
        let deliveries_clone = deliveries.clone();
        let second = pool.subscribe(
            &query,
            Observer::new(move |_| deliveries_clone.set(deliveries_clone.get() + 1)),
        );
        executor.run_until_stalled();

        assert!(!second.is_disposed());
        assert_eq!(deliveries.get(), 1);
        assert_eq!(pool.ref_count(&query), 1);
        assert_eq!(store.runs.get(), 2);
        assert!(reporter.reports.borrow().is_empty());

        let fresh = pool.subscription_for(&query);
        match (&stale, &fresh) {
            (Some(stale), Some(fresh)) => assert!(!Rc::ptr_eq(stale, fresh)),
            _ => panic!("expected both subscriptions"),
        }

        // The old handle no longer touches the replacement entry.
        first.dispose();
        assert_eq!(pool.ref_count(&query), 1);
        second.dispose();
        assert!(!pool.contains(&query));
    }

    #[test]
    fn test_named_entries_count_references_per_name() {
        let (_, _, _, pool) = fixture();
        let owned = pool.create_subscription(&Query::<Folder>::all());

        let a1 = pool.subscribe_named("a", owned.clone(), Observer::new(|_| {}));
        let a2 = pool.subscribe_named("a", owned.clone(), Observer::new(|_| {}));
        let b = pool.subscribe_named("b", owned.clone(), Observer::new(|_| {}));
        assert_eq!(pool.subscription_count(), 2);
        assert_eq!(owned.listener_count(), 3);

        a1.dispose();
        assert!(pool.contains_named("a"));
        a2.dispose();
        assert!(!pool.contains_named("a"));
        assert!(pool.contains_named("b"));
        assert!(!owned.is_disposed());

        b.dispose();
        assert!(!pool.contains_named("b"));
        assert!(owned.is_disposed());
        assert_eq!(pool.inner.entries.borrow().len(), 0);
    }

    #[test]
    fn test_dropping_pool_detaches_from_store() {
        let (_, store, _, pool) = fixture();
        assert_eq!(store.mutations.observer_count(), 1);
        drop(pool);
        assert_eq!(store.mutations.observer_count(), 0);
    }
}
