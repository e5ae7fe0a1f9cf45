//! telemetry/mod.rs
//! Per-stream counters and immutable snapshots.
//!
//! Industry notes:
//! - Counters live inside the owning controller, so no locks or atomics are needed.
//! - Snapshots are plain data and safe to hand to logging or reporting code.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
