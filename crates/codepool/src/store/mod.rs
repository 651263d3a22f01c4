//! Storage layers for the code pool.
//!
//! - [`KvStore`] - the contract a backing key-value store must meet: whole
//!   value reads, and writes conditioned on the version that was read.
//! - [`MemoryStore`] - an in-process [`KvStore`].
//! - [`QueueStore`] - the adapter that keeps a [`CodePool`](crate::CodePool)
//!   as JSON under one key.

mod interface;
mod memory;
mod queue;

pub use interface::*;
pub use memory::*;
pub use queue::*;
