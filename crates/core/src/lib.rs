//! Flowlet executor domain logic.
//!
//! Everything here is transport-agnostic: no HTTP, no callbacks, no worker
//! pool. The API crate wires these pieces into request handlers.
//!
//! - [`envelope`] -- the `SUCCESS` / `FAILED` result envelope.
//! - [`request`] -- execution mode and dispatch metadata.
//! - [`work_unit`] -- the [`WorkUnit`](work_unit::WorkUnit) trait and task payloads.
//! - [`retry`] -- bounded, fixed-count retry for any work unit.
//! - [`scripting`] -- subprocess plumbing and the shell work unit.
//! - [`units`] -- sample work units and hint-based routing.

pub mod envelope;
pub mod error;
pub mod request;
pub mod retry;
pub mod scripting;
pub mod units;
pub mod work_unit;
