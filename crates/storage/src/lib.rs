//! Persistence for the offline write queue.
//!
//! This crate provides a trait-based store for queue snapshots with a JSON
//! file implementation and an in-memory one.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{QueueStore, QueueSnapshot, MemoryQueueStore, StorageError, Result};
pub use json_storage::JsonQueueStore;
