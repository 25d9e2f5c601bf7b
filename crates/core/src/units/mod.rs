//! Sample work units shipped with the executor service.
//!
//! Real deployments replace these with their own domain units; they exist so
//! the service is runnable end to end and as reference implementations.

pub mod routed;
pub mod segment;

pub use routed::HintRouted;
pub use segment::SegmentMultiplier;
