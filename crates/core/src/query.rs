//! Query descriptors and their canonical keys.
//!
//! A `QueryDescriptor` is an immutable description of what to fetch: entity
//! type, AND-ed predicate terms, ordering terms and an optional limit/offset.
//! Its canonical serialization (`QueryKey`) is what the subscription pool
//! deduplicates on. Predicate terms are sorted before encoding, so the order
//! in which a caller added them never changes the key. Ordering terms keep
//! their order because it is significant.

use crate::model::Model;
use crate::record::Record;
use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::{self, Write};
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Comparison applied by a predicate term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredicateOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Field value equals one of the list operand's elements.
    In,
    /// String field contains the operand, or list field holds it.
    Contains,
}

impl PredicateOp {
    fn symbol(self) -> &'static str {
        match self {
            PredicateOp::Eq => "=",
            PredicateOp::Ne => "!=",
            PredicateOp::Lt => "<",
            PredicateOp::Le => "<=",
            PredicateOp::Gt => ">",
            PredicateOp::Ge => ">=",
            PredicateOp::In => " in ",
            PredicateOp::Contains => " contains ",
        }
    }
}

/// A single `field <op> value` term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub field: String,
    pub op: PredicateOp,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: PredicateOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, PredicateOp::Eq, value)
    }

    /// Evaluates the term against a record. Absent fields read as Null.
    pub fn matches(&self, record: &Record) -> bool {
        let null = Value::Null;
        let actual = record.get(&self.field).unwrap_or(&null);
        match self.op {
            PredicateOp::Eq => *actual == self.value,
            PredicateOp::Ne => *actual != self.value,
            PredicateOp::Lt => !actual.is_null() && *actual < self.value,
            PredicateOp::Le => !actual.is_null() && *actual <= self.value,
            PredicateOp::Gt => !actual.is_null() && *actual > self.value,
            PredicateOp::Ge => !actual.is_null() && *actual >= self.value,
            PredicateOp::In => self.value.contains(actual),
            PredicateOp::Contains => actual.contains(&self.value),
        }
    }

    fn encode_canonical(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{:?}{}", self.field, self.op.symbol());
        self.value.encode_canonical(&mut out);
        out
    }
}

/// Sort direction for an ordering term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

/// A single ordering term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Compares two records on this term. Absent fields sort as Null.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let null = Value::Null;
        let left = a.get(&self.field).unwrap_or(&null);
        let right = b.get(&self.field).unwrap_or(&null);
        match self.direction {
            Direction::Asc => left.cmp(right),
            Direction::Desc => right.cmp(left),
        }
    }
}

/// Canonical serialization of a query descriptor; the pool's dedup key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self.0)
    }
}

/// Immutable description of what to fetch.
///
/// Builder methods consume the descriptor and return a new one; a built
/// descriptor is never mutated. Equality and hashing go through the
/// canonical key.
#[derive(Clone, Debug)]
pub struct QueryDescriptor {
    entity_type: String,
    predicates: Vec<Predicate>,
    orderings: Vec<SortOrder>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl QueryDescriptor {
    /// Creates a descriptor matching every entity of the given type.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            predicates: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Adds a predicate term.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds an ordering term after the existing ones.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orderings.push(SortOrder::new(field, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[inline]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[inline]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[inline]
    pub fn orderings(&self) -> &[SortOrder] {
        &self.orderings
    }

    #[inline]
    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    #[inline]
    pub fn offset_value(&self) -> Option<usize> {
        self.offset
    }

    /// Returns true if a record satisfies every predicate term.
    pub fn matches(&self, record: &Record) -> bool {
        record.entity_type() == self.entity_type && self.predicates.iter().all(|p| p.matches(record))
    }

    /// Computes the canonical key.
    ///
    /// Layout: `<entity>?where=<t1>&<t2>|order=<f>:asc,...|limit=<n>|offset=<n>`,
    /// with predicate terms sorted and deduplicated (AND is idempotent and
    /// commutative). Sections with nothing to say are omitted.
    pub fn canonical_key(&self) -> QueryKey {
        let mut out = String::new();
        let _ = write!(out, "{:?}", self.entity_type);

        let mut terms: Vec<String> = self.predicates.iter().map(Predicate::encode_canonical).collect();
        terms.sort();
        terms.dedup();
        if !terms.is_empty() {
            out.push_str("?where=");
            out.push_str(&terms.join("&"));
        }

        if !self.orderings.is_empty() {
            out.push_str("|order=");
            for (i, order) in self.orderings.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let dir = match order.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                let _ = write!(out, "{:?}:{}", order.field, dir);
            }
        }

        if let Some(limit) = self.limit {
            let _ = write!(out, "|limit={}", limit);
        }
        if let Some(offset) = self.offset.filter(|&o| o > 0) {
            let _ = write!(out, "|offset={}", offset);
        }

        QueryKey(out)
    }
}

impl PartialEq for QueryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for QueryDescriptor {}

impl Hash for QueryDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

/// A query descriptor tied to the model type its results decode into.
pub struct Query<M> {
    descriptor: QueryDescriptor,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.descriptor).finish()
    }
}

impl<M: Model> Query<M> {
    /// Matches every entity of `M`.
    pub fn all() -> Self {
        Self {
            descriptor: QueryDescriptor::new(M::entity_type()),
            _model: PhantomData,
        }
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map(|d| d.filter(Predicate::eq(field, value)))
    }

    pub fn where_op(self, field: impl Into<String>, op: PredicateOp, value: impl Into<Value>) -> Self {
        self.map(|d| d.filter(Predicate::new(field, op, value)))
    }

    pub fn order_by(self, field: impl Into<String>, direction: Direction) -> Self {
        self.map(|d| d.order_by(field, direction))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.map(|d| d.limit(limit))
    }

    pub fn offset(self, offset: usize) -> Self {
        self.map(|d| d.offset(offset))
    }

    fn map(self, f: impl FnOnce(QueryDescriptor) -> QueryDescriptor) -> Self {
        Self {
            descriptor: f(self.descriptor),
            _model: PhantomData,
        }
    }
}

impl<M> Query<M> {
    #[inline]
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn canonical_key(&self) -> QueryKey {
        self.descriptor.canonical_key()
    }
}
