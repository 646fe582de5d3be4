//! Error reporting for failures that cannot propagate.
//!
//! Fetch failures and listener failures happen inside callbacks and spawned
//! tasks where no caller is waiting for a `Result`. They are handed to an
//! `ErrorReporter` instead, and the stream keeps running.

use rill_core::Error;

/// Tracing target used for every event emitted by this crate.
pub const LOG_TARGET: &str = "rill::reactive";

/// Sink for errors raised inside the reactive machinery.
pub trait ErrorReporter {
    /// Reports an error. `context` names where it happened
    /// (a query key, a subscription name, an operator).
    fn report(&self, context: &str, error: &Error);
}

/// Emits reported errors as `tracing` warnings.
///
/// Without the `tracing` feature this reporter drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    #[cfg(feature = "tracing")]
    fn report(&self, context: &str, error: &Error) {
        tracing::warn!(target: LOG_TARGET, context, %error, "reactive error");
    }

    #[cfg(not(feature = "tracing"))]
    fn report(&self, _context: &str, _error: &Error) {}
}

/// Discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn report(&self, _context: &str, _error: &Error) {}
}
