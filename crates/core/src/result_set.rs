//! Versioned, immutable query result snapshots.
//!
//! A `ResultSet` is produced by a live subscription on each recompute and
//! handed to listeners. It is never edited after construction: a newer result
//! is a new `ResultSet` with a higher version. Cloning shares the underlying
//! storage, so holding on to one across time is cheap and safe.

use crate::model::Model;
use crate::record::RecordId;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

/// An ordered snapshot of query output tagged with its version.
pub struct ResultSet<M> {
    version: u64,
    items: Rc<[Rc<M>]>,
}

impl<M> Clone for ResultSet<M> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            items: Rc::clone(&self.items),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for ResultSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("version", &self.version)
            .field("items", &self.items)
            .finish()
    }
}

impl<M> ResultSet<M> {
    /// Creates a result set from freshly fetched models.
    pub fn new(version: u64, items: Vec<M>) -> Self {
        Self {
            version,
            items: items.into_iter().map(Rc::new).collect(),
        }
    }

    /// Returns the version number. Versions start at 1 for the first fetch.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the result is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the entities in query order.
    #[inline]
    pub fn items(&self) -> &[Rc<M>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<M>> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Rc<M>> {
        self.items.first()
    }

    /// Returns true if both result sets share the same snapshot.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl<M: Model> ResultSet<M> {
    /// Returns the identifiers only, in query order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.items.iter().map(|m| m.id()).collect()
    }

    /// Finds an entity by ID.
    pub fn get(&self, id: RecordId) -> Option<&Rc<M>> {
        self.items.iter().find(|m| m.id() == id)
    }
}
