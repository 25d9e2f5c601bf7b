//! Request execution engine.
//!
//! The dispatcher decides between sync and async execution and shapes every
//! outcome into a result envelope; the proxy module provides the work unit
//! that forwards requests to an upstream service.

pub mod dispatcher;
pub mod meta;
pub mod proxy;

pub use dispatcher::{Dispatched, Dispatcher};
