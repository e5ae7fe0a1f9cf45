//! compression/mod.rs
//! Uniform block and stream compression over brotli, zlib and zstd.
//!
//! Industry notes:
//! - Block compression is two-phase: a sizing call returns a bound, a data call fills the buffer.
//! - Streams follow CREATED → PROCESSING → FINALIZING → FINALIZED; misuse is an error, not UB.
//! - Configuration records are sparse; only fields the caller set reach the backend.
//! - Registry factories validate up front and return boxed capabilities.

pub mod constants;
pub mod types;
pub mod params;
pub mod config;
pub mod block;
pub mod stream;
pub mod codecs;
pub mod registry;

pub use block::{compress_to_vec, decompress_to_vec, BlockBackend, BlockCompressor};
pub use config::*;
pub use stream::{drive_stream, drive_stream_with, StreamAdapter, StreamController};
pub use types::*;
pub use registry::*;
