//! Typed models decoded from store records.

use crate::error::Result;
use crate::record::{Record, RecordId};
use alloc::rc::Rc;

/// An entity type that live queries can return.
pub trait Model: 'static {
    /// Entity type tag used in query descriptors and change records.
    fn entity_type() -> &'static str
    where
        Self: Sized;

    /// Returns the record ID.
    fn id(&self) -> RecordId;

    /// Decodes a store record into the model.
    fn from_record(record: &Record) -> Result<Self>
    where
        Self: Sized;
}

/// Anything with a user-visible display name.
pub trait Named {
    fn display_name(&self) -> &str;
}

impl<T: Named + ?Sized> Named for Rc<T> {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }
}

impl<T: Named + ?Sized> Named for &T {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }
}
