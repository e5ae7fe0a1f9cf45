//! telemetry/snapshot.rs
//!
//! Immutable view over `StreamCounters`.
//!
//! Design notes:
//! - The ratio is output over input, so encoders report < 1.0 on compressible data
//!   and decoders report the expansion factor.
//! - Snapshots serialize to JSON for logs and test fixtures.

use serde::{Deserialize, Serialize};

use crate::compression::types::{Backend, CompressionError, Result, StreamState};
use crate::telemetry::counters::StreamCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub backend: Backend,
    pub state: StreamState,
    pub update_calls: u64,
    pub finalize_calls: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub ratio: f64,
}

impl StreamSnapshot {
    pub fn from(backend: Backend, state: StreamState, counters: &StreamCounters) -> Self {
        let ratio = if counters.bytes_in > 0 {
            counters.bytes_out as f64 / counters.bytes_in as f64
        } else {
            0.0
        };

        Self {
            backend,
            state,
            update_calls: counters.update_calls,
            finalize_calls: counters.finalize_calls,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            ratio,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CompressionError::backend(self.backend.name(), e.to_string()))
    }
}
