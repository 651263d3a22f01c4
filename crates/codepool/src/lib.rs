#![doc = include_str!("../README.md")]

mod coordinator;
mod error;
mod pool;
mod runtime;
#[cfg(feature = "tokio")]
mod serial;
mod store;

pub use crate::coordinator::*;
pub use crate::error::*;
pub use crate::pool::*;
pub use crate::runtime::*;
#[cfg(feature = "tokio")]
pub use crate::serial::*;
pub use crate::store::*;
