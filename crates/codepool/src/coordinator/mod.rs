//! The atomic pop: remove and return the head of the pool exactly once.
//!
//! - [`Coordinator`] - the read/pop/conditional-write cycle and its retry
//!   loop.
//! - [`RetryPolicy`] - how many conflicting attempts are made and how long to
//!   back off between them.
//! - [`PopStatus`] - the outcome of a single attempt.

mod pop;
mod retry;
mod status;
#[cfg(test)]
mod tests;

pub use pop::*;
pub use retry::*;
pub use status::*;
