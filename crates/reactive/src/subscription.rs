//! Live subscriptions.
//!
//! A `LiveSubscription` serves one query: it holds the latest `ResultSet`,
//! refetches when told a relevant mutation happened, and publishes each new
//! result to its listeners in registration order.
//!
//! Fetches run as spawned tasks. While one is in flight, further mutation
//! signals only set a dirty flag; when the fetch completes, at most one
//! follow-up fetch is started. The task holds a weak reference and checks the
//! subscription is still alive before publishing.

use crate::listeners::{ListenerId, ListenerSet};
use crate::observable::Observer;
use crate::report::ErrorReporter;
use crate::source::ObjectStore;
use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;
use futures::task::{LocalSpawn, LocalSpawnExt};
use rill_core::{ChangeRecord, Error, Model, Query, QueryDescriptor, QueryKey, Record, Result, ResultSet};

/// Lifecycle state of a live subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created, no listener registered yet.
    Unregistered,
    /// Serving listeners.
    Active,
    /// Terminal. Never reactivated.
    Disposed,
}

/// A continuously updated view of one query.
pub struct LiveSubscription<M> {
    this: Weak<Self>,
    query: QueryDescriptor,
    key: QueryKey,
    store: Rc<dyn ObjectStore>,
    spawner: Rc<dyn LocalSpawn>,
    reporter: Rc<dyn ErrorReporter>,
    state: Cell<SubscriptionState>,
    /// Latest published result; `None` until the first fetch completes.
    result: RefCell<Option<ResultSet<M>>>,
    listeners: ListenerSet<ResultSet<M>>,
    in_flight: Cell<bool>,
    dirty: Cell<bool>,
    version: Cell<u64>,
    fetch_count: Cell<u64>,
}

impl<M: Model> LiveSubscription<M> {
    /// Creates an unregistered subscription. Nothing is fetched until the
    /// first listener arrives.
    pub fn new(
        query: &Query<M>,
        store: Rc<dyn ObjectStore>,
        spawner: Rc<dyn LocalSpawn>,
        reporter: Rc<dyn ErrorReporter>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            query: query.descriptor().clone(),
            key: query.canonical_key(),
            store,
            spawner,
            reporter,
            state: Cell::new(SubscriptionState::Unregistered),
            result: RefCell::new(None),
            listeners: ListenerSet::new(),
            in_flight: Cell::new(false),
            dirty: Cell::new(false),
            version: Cell::new(0),
            fetch_count: Cell::new(0),
        })
    }

    #[inline]
    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    #[inline]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    #[inline]
    pub fn state(&self) -> SubscriptionState {
        self.state.get()
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.state.get() == SubscriptionState::Disposed
    }

    /// Returns the version of the latest published result (0 before the
    /// first publish).
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Returns the number of fetches started so far.
    #[inline]
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.get()
    }

    #[inline]
    pub fn is_fetch_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns the latest published result, if any.
    pub fn result(&self) -> Option<ResultSet<M>> {
        self.result.borrow().clone()
    }

    /// Registers a listener.
    ///
    /// The first registration activates the subscription and starts the
    /// initial fetch. Later registrations receive the current result right
    /// away if one has been published. Returns `None` once disposed.
    pub fn add_listener(&self, observer: Observer<ResultSet<M>>) -> Option<ListenerId> {
        match self.state.get() {
            SubscriptionState::Disposed => None,
            SubscriptionState::Unregistered => {
                let id = self.listeners.insert(observer);
                self.state.set(SubscriptionState::Active);
                debug!(key = %self.key, "live subscription activated");
                self.request_fetch();
                Some(id)
            }
            SubscriptionState::Active => {
                let id = self.listeners.insert(observer.clone());
                let current = self.result();
                if let Some(current) = current {
                    observer.deliver(&current, &*self.reporter, self.key.as_str());
                }
                Some(id)
            }
        }
    }

    /// Removes a listener and returns how many remain.
    pub fn remove_listener(&self, id: ListenerId) -> usize {
        self.listeners.remove(id);
        self.listeners.len()
    }

    /// Handles a mutation announced by the store.
    pub fn on_mutation(&self, change: &ChangeRecord) {
        if change.entity_type != self.query.entity_type() {
            return;
        }
        self.request_fetch();
    }

    /// Requests a recompute, coalescing with a fetch already in flight.
    pub fn request_fetch(&self) {
        if self.state.get() != SubscriptionState::Active {
            return;
        }
        if self.in_flight.get() {
            self.dirty.set(true);
            trace!(key = %self.key, "fetch coalesced");
            return;
        }
        self.start_fetch();
    }

    /// Transitions to `Disposed` and drops every listener. Idempotent.
    ///
    /// A fetch in flight still completes, but its result is discarded.
    pub fn dispose(&self) {
        if self.state.replace(SubscriptionState::Disposed) == SubscriptionState::Disposed {
            return;
        }
        self.listeners.clear();
        debug!(key = %self.key, "live subscription disposed");
    }

    fn start_fetch(&self) {
        self.in_flight.set(true);
        self.fetch_count.set(self.fetch_count.get() + 1);

        let fetch = self.store.run(&self.query);
        let this = self.this.clone();
        let spawned = self.spawner.spawn_local(async move {
            let outcome = fetch.await;
            if let Some(subscription) = this.upgrade() {
                subscription.complete_fetch(outcome);
            }
        });

        if let Err(err) = spawned {
            self.in_flight.set(false);
            self.dirty.set(false);
            self.reporter
                .report(self.key.as_str(), &Error::spawn(format!("{}", err)));
        }
    }

    fn complete_fetch(&self, outcome: Result<Vec<Record>>) {
        if self.state.get() == SubscriptionState::Disposed {
            self.in_flight.set(false);
            self.dirty.set(false);
            trace!(key = %self.key, "stale fetch result discarded");
            return;
        }

        match outcome.and_then(|records| decode::<M>(&records)) {
            Ok(models) => self.publish(models),
            // Keep the last good result; the next mutation retries.
            Err(err) => self.reporter.report(self.key.as_str(), &err),
        }

        let follow_up = self.dirty.replace(false);
        if follow_up && self.state.get() == SubscriptionState::Active {
            self.start_fetch();
        } else {
            self.in_flight.set(false);
        }
    }

    fn publish(&self, models: Vec<M>) {
        let version = self.version.get() + 1;
        self.version.set(version);

        let result = ResultSet::new(version, models);
        *self.result.borrow_mut() = Some(result.clone());

        let reporter = &self.reporter;
        let key = self.key.as_str();
        self.listeners
            .notify(&result, |_, err| reporter.report(key, &err));
    }
}

fn decode<M: Model>(records: &[Record]) -> Result<Vec<M>> {
    records.iter().map(M::from_record).collect()
}

impl<M> fmt::Debug for LiveSubscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSubscription")
            .field("key", &self.key)
            .field("state", &self.state.get())
            .field("version", &self.version.get())
            .field("in_flight", &self.in_flight.get())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

/// Type-erased view the pool keeps of each subscription.
pub(crate) trait PooledSubscription {
    fn entity_type(&self) -> &str;
    fn on_mutation(&self, change: &ChangeRecord);
    fn is_disposed(&self) -> bool;
    fn dispose(&self);
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<M: Model> PooledSubscription for LiveSubscription<M> {
    fn entity_type(&self) -> &str {
        self.query.entity_type()
    }

    fn on_mutation(&self, change: &ChangeRecord) {
        LiveSubscription::on_mutation(self, change);
    }

    fn is_disposed(&self) -> bool {
        LiveSubscription::is_disposed(self)
    }

    fn dispose(&self) {
        LiveSubscription::dispose(self);
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposable::Disposable;
    use crate::report::testing::RecordingReporter;
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use futures::executor::LocalPool;
    use futures::future::FutureExt;
    use rill_core::{Folder, RecordId};

    /// Resolves every fetch with the rows held at the time of the call.
    #[derive(Default)]
    struct StubStore {
        rows: RefCell<Vec<Record>>,
        fail: Cell<bool>,
    }

    impl StubStore {
        fn put(&self, folder: Folder) {
            self.rows.borrow_mut().push(folder.to_record());
        }
    }

    impl ObjectStore for StubStore {
        fn run(&self, query: &QueryDescriptor) -> crate::source::FetchFuture {
            let outcome = if self.fail.get() {
                Err(Error::fetch_failed(query.canonical_key().as_str(), "disk on fire"))
            } else {
                Ok(self.rows.borrow().clone())
            };
            async move { outcome }.boxed_local()
        }

        fn on_mutation(&self, _callback: Box<dyn Fn(&ChangeRecord)>) -> Disposable {
            Disposable::empty()
        }
    }

    struct Fixture {
        pool: LocalPool,
        store: Rc<StubStore>,
        reporter: Rc<RecordingReporter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                pool: LocalPool::new(),
                store: Rc::new(StubStore::default()),
                reporter: Rc::new(RecordingReporter::default()),
            }
        }

        fn subscription(&self) -> Rc<LiveSubscription<Folder>> {
            LiveSubscription::new(
                &Query::<Folder>::all(),
                self.store.clone(),
                Rc::new(self.pool.spawner()),
                self.reporter.clone(),
            )
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<(u64, Vec<RecordId>)>>>, Observer<ResultSet<Folder>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let observer = Observer::new(move |rs: &ResultSet<Folder>| {
            seen_clone.borrow_mut().push((rs.version(), rs.ids()))
        });
        (seen, observer)
    }

    #[test]
    fn test_first_listener_activates_and_fetches() {
        let mut fx = Fixture::new();
        fx.store.put(Folder::new(1, "a1", "Inbox"));
        let sub = fx.subscription();
        assert_eq!(sub.state(), SubscriptionState::Unregistered);
        assert_eq!(sub.fetch_count(), 0);

        let (seen, observer) = recorder();
        sub.add_listener(observer);
        assert_eq!(sub.state(), SubscriptionState::Active);
        assert!(sub.is_fetch_in_flight());

        fx.pool.run_until_stalled();
        assert!(!sub.is_fetch_in_flight());
        assert_eq!(*seen.borrow(), vec![(1, vec![1])]);
        assert_eq!(sub.version(), 1);
    }

    #[test]
    fn test_late_listener_gets_current_result() {
        let mut fx = Fixture::new();
        fx.store.put(Folder::new(1, "a1", "Inbox"));
        let sub = fx.subscription();
        let (_, first) = recorder();
        sub.add_listener(first);
        fx.pool.run_until_stalled();

        let (seen, second) = recorder();
        sub.add_listener(second);
        assert_eq!(*seen.borrow(), vec![(1, vec![1])]);
        assert_eq!(sub.fetch_count(), 1);
    }

    #[test]
    fn test_mutations_coalesce_while_in_flight() {
        let mut fx = Fixture::new();
        let sub = fx.subscription();
        let (seen, observer) = recorder();
        sub.add_listener(observer);

        let change = ChangeRecord::insert("folder", vec![1]);
        for _ in 0..5 {
            sub.on_mutation(&change);
        }
        fx.store.put(Folder::new(1, "a1", "Inbox"));
        fx.pool.run_until_stalled();

        assert_eq!(sub.fetch_count(), 2);
        assert_eq!(seen.borrow().last(), Some(&(2, vec![1])));
    }

    #[test]
    fn test_unrelated_entity_type_is_ignored() {
        let mut fx = Fixture::new();
        let sub = fx.subscription();
        let (_, observer) = recorder();
        sub.add_listener(observer);
        fx.pool.run_until_stalled();

        sub.on_mutation(&ChangeRecord::update("label", vec![9]));
        fx.pool.run_until_stalled();
        assert_eq!(sub.fetch_count(), 1);
    }

    #[test]
    fn test_fetch_failure_keeps_last_result() {
        let mut fx = Fixture::new();
        fx.store.put(Folder::new(1, "a1", "Inbox"));
        let sub = fx.subscription();
        let (seen, observer) = recorder();
        sub.add_listener(observer);
        fx.pool.run_until_stalled();

        fx.store.fail.set(true);
        sub.on_mutation(&ChangeRecord::update("folder", vec![1]));
        fx.pool.run_until_stalled();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(sub.result().map(|rs| rs.version()), Some(1));
        assert_eq!(fx.reporter.reports.borrow().len(), 1);
        assert_eq!(sub.state(), SubscriptionState::Active);

        fx.store.fail.set(false);
        sub.on_mutation(&ChangeRecord::update("folder", vec![1]));
        fx.pool.run_until_stalled();
        assert_eq!(seen.borrow().last(), Some(&(2, vec![1])));
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let mut fx = Fixture::new();
        fx.store
            .rows
            .borrow_mut()
            .push(Record::new("folder", 5).with("display_name", "Orphan"));
        let sub = fx.subscription();
        let (seen, observer) = recorder();
        sub.add_listener(observer);
        fx.pool.run_until_stalled();

        assert!(seen.borrow().is_empty());
        let reports = fx.reporter.reports.borrow();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].1, Error::Decode { .. }));
    }

    #[test]
    fn test_dispose_discards_in_flight_result() {
        let mut fx = Fixture::new();
        fx.store.put(Folder::new(1, "a1", "Inbox"));
        let sub = fx.subscription();
        let (seen, observer) = recorder();
        sub.add_listener(observer);

        sub.dispose();
        sub.dispose();
        fx.pool.run_until_stalled();

        assert!(seen.borrow().is_empty());
        assert_eq!(sub.version(), 0);
        assert!(!sub.is_fetch_in_flight());
        assert!(sub.add_listener(Observer::new(|_| {})).is_none());
    }

    #[test]
    fn test_listener_failure_does_not_stop_others() {
        let mut fx = Fixture::new();
        let sub = fx.subscription();
        sub.add_listener(Observer::fallible(|_: &ResultSet<Folder>| {
            Err(Error::listener("bad listener"))
        }));
        let (seen, observer) = recorder();
        sub.add_listener(observer);
        fx.pool.run_until_stalled();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(
            *fx.reporter.reports.borrow(),
            vec![(String::from(sub.key().as_str()), Error::listener("bad listener"))]
        );
    }
}
