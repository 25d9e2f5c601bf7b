//! Completion notifications for asynchronously executed tasks.
//!
//! - [`CallbackNotifier`] -- the seam the dispatcher talks to.
//! - [`HttpCallbackNotifier`] -- single-attempt JSON POST over `reqwest`.

pub mod delivery;

pub use delivery::callback::{
    CallbackError, CallbackNotifier, HttpCallbackNotifier, DEFAULT_CALLBACK_TIMEOUT,
};
