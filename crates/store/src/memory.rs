//! In-memory object store.
//!
//! `MemoryStore` keeps records per entity type, executes query descriptors
//! (filter, order, offset, limit) and announces every write on its mutation
//! channel. Fetch latency is controllable: in `FetchMode::Deferred` every
//! fetch stays pending until the test releases it, and its outcome is
//! computed at release time.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::cmp::Ordering;
use futures::channel::oneshot;
use futures::future::FutureExt;
use hashbrown::HashMap;
use rill_core::{ChangeRecord, Error, MutationKind, QueryDescriptor, QueryKey, Record, RecordId, Result};
use rill_reactive::{Disposable, FetchFuture, MutationCallback, ObjectStore, ObservableExt, Subject};

/// When fetches resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Resolve on the first poll with the data at call time.
    #[default]
    Immediate,
    /// Stay pending until `release_next` / `release_all`.
    Deferred,
}

/// A fetch waiting to be released.
struct PendingFetch {
    query: QueryDescriptor,
    reply: oneshot::Sender<Result<Vec<Record>>>,
}

/// Record tables keyed by entity type, then record ID.
type Tables = BTreeMap<String, BTreeMap<RecordId, Record>>;

/// In-memory object store with mutation notifications.
pub struct MemoryStore {
    tables: RefCell<Tables>,
    mutations: Subject<ChangeRecord>,
    mode: Cell<FetchMode>,
    pending: RefCell<VecDeque<PendingFetch>>,
    /// Injected failures, consumed one per evaluated fetch.
    failures: RefCell<VecDeque<String>>,
    fetch_count: Cell<usize>,
    fetches_by_key: RefCell<HashMap<QueryKey, usize>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store that resolves fetches immediately.
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(BTreeMap::new()),
            mutations: Subject::new(),
            mode: Cell::new(FetchMode::Immediate),
            pending: RefCell::new(VecDeque::new()),
            failures: RefCell::new(VecDeque::new()),
            fetch_count: Cell::new(0),
            fetches_by_key: RefCell::new(HashMap::new()),
        }
    }

    /// Creates an empty store with the given fetch mode.
    pub fn with_fetch_mode(mode: FetchMode) -> Self {
        let store = Self::new();
        store.mode.set(mode);
        store
    }

    pub fn set_fetch_mode(&self, mode: FetchMode) {
        self.mode.set(mode);
    }

    #[inline]
    pub fn fetch_mode(&self) -> FetchMode {
        self.mode.get()
    }

    /// Inserts or replaces a record and announces the write.
    pub fn put(&self, record: Record) {
        let entity_type = record.entity_type().to_string();
        let id = record.id();
        let previous = self
            .tables
            .borrow_mut()
            .entry(entity_type.clone())
            .or_default()
            .insert(id, record);
        let kind = if previous.is_some() {
            MutationKind::Update
        } else {
            MutationKind::Insert
        };
        self.emit(&ChangeRecord::new(entity_type, kind, alloc::vec![id]));
    }

    /// Inserts or replaces several records, announcing one change per
    /// entity type. The change is an update if any record replaced an
    /// existing one.
    pub fn put_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        let mut changes: BTreeMap<String, (MutationKind, Vec<RecordId>)> = BTreeMap::new();
        {
            let mut tables = self.tables.borrow_mut();
            for record in records {
                let entity_type = record.entity_type().to_string();
                let id = record.id();
                let replaced = tables
                    .entry(entity_type.clone())
                    .or_default()
                    .insert(id, record)
                    .is_some();
                let change = changes
                    .entry(entity_type)
                    .or_insert((MutationKind::Insert, Vec::new()));
                if replaced {
                    change.0 = MutationKind::Update;
                }
                change.1.push(id);
            }
        }
        for (entity_type, (kind, ids)) in changes {
            self.emit(&ChangeRecord::new(entity_type, kind, ids));
        }
    }

    /// Removes a record, announcing the delete if it existed.
    pub fn remove(&self, entity_type: &str, id: RecordId) -> Option<Record> {
        let removed = self
            .tables
            .borrow_mut()
            .get_mut(entity_type)
            .and_then(|table| table.remove(&id));
        if removed.is_some() {
            self.emit(&ChangeRecord::delete(entity_type, alloc::vec![id]));
        }
        removed
    }

    /// Announces a change without touching any data.
    pub fn emit(&self, change: &ChangeRecord) {
        self.mutations.next(change);
    }

    pub fn get(&self, entity_type: &str, id: RecordId) -> Option<Record> {
        self.tables
            .borrow()
            .get(entity_type)
            .and_then(|table| table.get(&id))
            .cloned()
    }

    /// Returns the number of records of `entity_type`.
    pub fn len(&self, entity_type: &str) -> usize {
        self.tables.borrow().get(entity_type).map_or(0, BTreeMap::len)
    }

    /// Makes the next evaluated fetch fail with `message`.
    pub fn fail_next_fetch(&self, message: &str) {
        self.failures.borrow_mut().push_back(message.to_string());
    }

    /// Returns the number of fetches issued so far.
    #[inline]
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.get()
    }

    /// Returns the number of fetches issued for one query key.
    pub fn fetch_count_for(&self, key: &QueryKey) -> usize {
        self.fetches_by_key.borrow().get(key).copied().unwrap_or(0)
    }

    /// Returns the number of deferred fetches not yet released.
    pub fn pending_fetches(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Resolves the oldest deferred fetch. Returns false if none is pending.
    pub fn release_next(&self) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(pending) => {
                let outcome = self.execute(&pending.query);
                // The receiver is gone if the awaiting task was dropped.
                let _ = pending.reply.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Resolves every deferred fetch pending right now. Returns how many.
    pub fn release_all(&self) -> usize {
        let mut released = 0;
        while self.release_next() {
            released += 1;
        }
        released
    }

    /// Returns the number of mutation listeners.
    pub fn mutation_listener_count(&self) -> usize {
        self.mutations.observer_count()
    }

    fn execute(&self, query: &QueryDescriptor) -> Result<Vec<Record>> {
        let failure = self.failures.borrow_mut().pop_front();
        if let Some(message) = failure {
            return Err(Error::fetch_failed(query.canonical_key().as_str(), message));
        }

        let tables = self.tables.borrow();
        let mut rows: Vec<Record> = tables
            .get(query.entity_type())
            .map(|table| table.values().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if !query.orderings().is_empty() {
            rows.sort_by(|a, b| {
                query
                    .orderings()
                    .iter()
                    .map(|order| order.compare(a, b))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = query.offset_value().unwrap_or(0);
        let limit = query.limit_value().unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

impl ObjectStore for MemoryStore {
    fn run(&self, query: &QueryDescriptor) -> FetchFuture {
        self.fetch_count.set(self.fetch_count.get() + 1);
        *self
            .fetches_by_key
            .borrow_mut()
            .entry(query.canonical_key())
            .or_insert(0) += 1;

        match self.mode.get() {
            FetchMode::Immediate => {
                let outcome = self.execute(query);
                async move { outcome }.boxed_local()
            }
            FetchMode::Deferred => {
                let (reply, response) = oneshot::channel();
                self.pending.borrow_mut().push_back(PendingFetch {
                    query: query.clone(),
                    reply,
                });
                async move {
                    match response.await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(Error::store("deferred fetch dropped before release")),
                    }
                }
                .boxed_local()
            }
        }
    }

    fn on_mutation(&self, callback: MutationCallback) -> Disposable {
        self.mutations.subscribe(move |change| callback(change))
    }
}
