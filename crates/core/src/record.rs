//! Records and change records.
//!
//! A `Record` is the untyped snapshot an object store hands back for one
//! entity. A `ChangeRecord` describes a mutation the store has persisted.

use crate::error::{Error, Result};
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Unique identifier for a record within its entity type.
pub type RecordId = u64;

/// An entity snapshot as stored by the object store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Identifier of the entity.
    id: RecordId,
    /// Entity type tag (`"folder"`, `"label"`, ...).
    entity_type: String,
    /// Named field values.
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record of the given entity type.
    pub fn new(entity_type: impl Into<String>, id: RecordId) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns this record with `field` set to `value`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns the record ID.
    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the entity type tag.
    #[inline]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Gets a field value. Absent fields read as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field value, returning the previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Iterates over fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads a required string field.
    pub fn require_str(&self, field: &str) -> Result<&str> {
        match self.fields.get(field) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(Error::decode(&self.entity_type, field, "expected a string")),
            None => Err(Error::decode(&self.entity_type, field, "missing field")),
        }
    }

    /// Reads an optional string field. Null and absent both read as `None`.
    pub fn optional_str(&self, field: &str) -> Result<Option<&str>> {
        match self.fields.get(field) {
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(Value::Null) | None => Ok(None),
            Some(_) => Err(Error::decode(&self.entity_type, field, "expected a string")),
        }
    }
}

/// Kind of mutation reported by the object store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

/// A persisted change, as announced on the store's mutation channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Entity type of the affected records.
    pub entity_type: String,
    /// What happened to them.
    pub kind: MutationKind,
    /// IDs of the affected records.
    pub ids: Vec<RecordId>,
}

impl ChangeRecord {
    /// Creates a change record.
    pub fn new(entity_type: impl Into<String>, kind: MutationKind, ids: Vec<RecordId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            kind,
            ids,
        }
    }

    /// Creates an insert change record.
    pub fn insert(entity_type: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self::new(entity_type, MutationKind::Insert, ids)
    }

    /// Creates an update change record.
    pub fn update(entity_type: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self::new(entity_type, MutationKind::Update, ids)
    }

    /// Creates a delete change record.
    pub fn delete(entity_type: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self::new(entity_type, MutationKind::Delete, ids)
    }
}
