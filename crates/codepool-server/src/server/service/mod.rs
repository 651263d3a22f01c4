//! HTTP surface of the code dispenser.
//!
//! ## Structure
//!
//! - [`dispenser`] - the pop strategy selected at startup.
//! - [`handler`] - the axum router and method dispatch.
//! - [`response`] - JSON bodies, CORS headers and error mapping.

pub mod dispenser;
pub mod handler;
pub mod response;
