//! Error types for Rill.

use alloc::string::String;
use core::fmt;

/// Result type alias for Rill operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types raised by the live-query engine and its collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The object store failed to execute a query.
    FetchFailed {
        query: String,
        message: String,
    },
    /// A fetched record could not be decoded into its model type.
    Decode {
        entity_type: String,
        field: String,
        message: String,
    },
    /// A listener callback reported a failure.
    Listener {
        message: String,
    },
    /// A collaborator store reported a failure outside of a fetch.
    Store {
        message: String,
    },
    /// A fetch task could not be handed to the executor.
    Spawn {
        message: String,
    },
    /// A listener was attached to a subscription that was already disposed.
    SubscriptionDisposed {
        name: String,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FetchFailed { query, message } => {
                write!(f, "Fetch failed for {}: {}", query, message)
            }
            Error::Decode {
                entity_type,
                field,
                message,
            } => {
                write!(f, "Cannot decode {}.{}: {}", entity_type, field, message)
            }
            Error::Listener { message } => write!(f, "Listener failed: {}", message),
            Error::Store { message } => write!(f, "Store error: {}", message),
            Error::Spawn { message } => write!(f, "Cannot spawn fetch task: {}", message),
            Error::SubscriptionDisposed { name } => {
                write!(f, "Subscription already disposed: {}", name)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a fetch failure error.
    pub fn fetch_failed(query: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FetchFailed {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Decode {
            entity_type: entity_type.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a listener failure error.
    pub fn listener(message: impl Into<String>) -> Self {
        Error::Listener {
            message: message.into(),
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
        }
    }

    /// Creates a spawn error.
    pub fn spawn(message: impl Into<String>) -> Self {
        Error::Spawn {
            message: message.into(),
        }
    }

    /// Creates a disposed-subscription error.
    pub fn subscription_disposed(name: impl Into<String>) -> Self {
        Error::SubscriptionDisposed { name: name.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}
