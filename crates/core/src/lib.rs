//! Rill Core - Value types for the Rill live-query engine.
//!
//! This crate provides the immutable data the subscription engine moves around:
//!
//! - `Value`: Field values and predicate operands
//! - `Record`: Untyped entity snapshot returned by an object store
//! - `ChangeRecord`: Mutation announced by an object store
//! - `QueryDescriptor` / `Query<M>`: What to fetch, with a canonical `QueryKey`
//! - `ResultSet<M>`: Versioned, immutable query output
//! - `Model`: Typed decoding of records
//! - `category`: Folder and label domain entities
//! - `Error`: Error types shared by every Rill crate
//!
//! # Example
//!
//! ```rust
//! use rill_core::{Direction, Folder, Query};
//!
//! let a = Query::<Folder>::all()
//!     .where_eq("account_id", "a1")
//!     .where_eq("role", "inbox")
//!     .order_by("display_name", Direction::Asc);
//! let b = Query::<Folder>::all()
//!     .where_eq("role", "inbox")
//!     .where_eq("account_id", "a1")
//!     .order_by("display_name", Direction::Asc);
//!
//! // Predicate order does not matter: both collapse to one key.
//! assert_eq!(a.canonical_key(), b.canonical_key());
//! ```

#![no_std]

extern crate alloc;

pub mod category;
mod error;
mod model;
mod query;
mod record;
mod result_set;
mod value;

pub use category::{Category, CategoryRef, Folder, Label};
pub use error::{Error, Result};
pub use model::{Model, Named};
pub use query::{Direction, Predicate, PredicateOp, Query, QueryDescriptor, QueryKey, SortOrder};
pub use record::{ChangeRecord, MutationKind, Record, RecordId};
pub use result_set::ResultSet;
pub use value::Value;
