//! External delivery channels for task results.
//!
//! Only HTTP callbacks exist today; the orchestrator names the target URL
//! per request.

pub mod callback;
