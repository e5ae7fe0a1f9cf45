//! telemetry/counters.rs
//! Mutable counters collected by a stream controller.
//!
//! Summary: Counts lifecycle calls and bytes moved across the capability
//! boundary. Converted into an immutable `StreamSnapshot` on demand.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCounters {
    pub update_calls: u64,
    pub finalize_calls: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl StreamCounters {
    /// Record one `update` call.
    ///
    /// - `consumed`: input bytes the backend accepted
    /// - `produced`: output bytes the backend wrote
    pub fn add_update(&mut self, consumed: usize, produced: usize) {
        self.update_calls += 1;
        self.bytes_in += consumed as u64;
        self.bytes_out += produced as u64;
    }

    /// Record one `finalize` call that reached the backend.
    pub fn add_finalize(&mut self, produced: usize) {
        self.finalize_calls += 1;
        self.bytes_out += produced as u64;
    }

    pub fn merge(&mut self, other: &StreamCounters) {
        self.update_calls += other.update_calls;
        self.finalize_calls += other.finalize_calls;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
    }
}

impl AddAssign for StreamCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
