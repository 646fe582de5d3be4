//! Rill Store - In-memory collaborators for the Rill live-query engine.
//!
//! The reactive engine talks to the outside world through the traits in
//! `rill_reactive::source`. This crate implements them in memory:
//!
//! - `MemoryStore`: Object store that executes query descriptors, with
//!   controllable fetch latency and failure injection
//! - `MemoryConfig`: Configuration store with per-key change notifications
//! - `Action<T>`: Fire-and-forget event bus
//! - `SignalStore`, `SelectionList`, `ListSelectionStore`: Push-notification stores

#![no_std]

extern crate alloc;

mod action;
mod config;
mod memory;
mod signal;

pub use action::Action;
pub use config::MemoryConfig;
pub use memory::{FetchMode, MemoryStore};
pub use signal::{ListSelectionStore, SelectionList, SignalStore};
