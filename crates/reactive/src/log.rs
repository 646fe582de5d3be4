//! Lifecycle logging.
//!
//! Thin wrappers over `tracing` that compile to nothing without the
//! `tracing` feature. Every event uses the crate's log target.

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: $crate::report::LOG_TARGET, $($arg)*);
    };
}

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(target: $crate::report::LOG_TARGET, $($arg)*);
    };
}
