//! compression/types.rs
//! Error type, backend IDs and the three capability traits.
//!
//! Design notes:
//! - `Compressor` and `Decompressor` are one-shot: no state survives between calls.
//! - `Stream` is driven through a four-state lifecycle owned by `StreamController`.
//! - Every capability owns exactly one native context and is `Send` but not `Sync`.

use std::fmt;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compression::constants::backend_ids;
use crate::telemetry::StreamCounters;
use crate::utils::enum_name_or_hex;

/// FFI-safe enum for backend identifiers.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Brotli = backend_ids::BROTLI,
    Zlib   = backend_ids::ZLIB,
    Zstd   = backend_ids::ZSTD,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Brotli => "brotli",
            Backend::Zlib => "zlib",
            Backend::Zstd => "zstd",
        }
    }

    pub fn from_id(raw: u16) -> Result<Self> {
        Backend::try_from_primitive(raw).map_err(|_| CompressionError::UnsupportedBackend { raw })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle states of a stream. Transitions only move forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamState {
    Created,
    Processing,
    Finalizing,
    Finalized,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamState::Created => "CREATED",
            StreamState::Processing => "PROCESSING",
            StreamState::Finalizing => "FINALIZING",
            StreamState::Finalized => "FINALIZED",
        };
        f.write_str(s)
    }
}

/// Coarse classification of [`CompressionError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfiguration,
    InsufficientCapacity,
    CorruptInput,
    InvalidUsage,
    Backend,
    Io,
}

pub type Result<T> = std::result::Result<T, CompressionError>;

#[derive(Debug, Error)]
pub enum CompressionError {
    /// A parameter is out of range or was refused by the backend.
    #[error("{backend}: invalid configuration: {msg}")]
    InvalidConfiguration { backend: &'static str, msg: String },

    /// The caller's output buffer cannot hold the result.
    #[error("{backend}: output buffer too small ({capacity} bytes){}", needed_suffix(*.required))]
    InsufficientCapacity {
        backend: &'static str,
        capacity: usize,
        required: Option<usize>,
    },

    /// Compressed input is malformed or truncated.
    #[error("{backend}: corrupt input: {msg}")]
    CorruptInput { backend: &'static str, msg: String },

    /// Operation not allowed in the stream's current state.
    #[error("{op} not allowed in stream state {state}")]
    InvalidUsage { op: &'static str, state: StreamState },

    /// Native codec failed while processing.
    #[error("{backend}: operation failed: {msg}")]
    Backend { backend: &'static str, msg: String },

    #[error("unsupported backend: {}", enum_name_or_hex::<Backend>(*.raw))]
    UnsupportedBackend { raw: u16 },

    /// Reader or writer failure in the stream pump helpers.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

fn needed_suffix(required: Option<usize>) -> String {
    match required {
        Some(n) => format!(", need up to {n}"),
        None => String::new(),
    }
}

impl CompressionError {
    pub fn invalid_config(backend: &'static str, msg: impl Into<String>) -> Self {
        CompressionError::InvalidConfiguration { backend, msg: msg.into() }
    }

    pub fn corrupt(backend: &'static str, msg: impl Into<String>) -> Self {
        CompressionError::CorruptInput { backend, msg: msg.into() }
    }

    pub fn backend(backend: &'static str, msg: impl Into<String>) -> Self {
        CompressionError::Backend { backend, msg: msg.into() }
    }

    pub fn capacity(backend: &'static str, capacity: usize, required: Option<usize>) -> Self {
        CompressionError::InsufficientCapacity { backend, capacity, required }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressionError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            CompressionError::UnsupportedBackend { .. } => ErrorKind::InvalidConfiguration,
            CompressionError::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
            CompressionError::CorruptInput { .. } => ErrorKind::CorruptInput,
            CompressionError::InvalidUsage { .. } => ErrorKind::InvalidUsage,
            CompressionError::Backend { .. } => ErrorKind::Backend,
            CompressionError::Io(_) => ErrorKind::Io,
        }
    }

    /// True when the caller's own code is wrong rather than its data.
    pub fn is_usage_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidUsage
    }

    /// True for the data-plane failures a one-shot call can report.
    pub fn is_operation_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InsufficientCapacity | ErrorKind::CorruptInput | ErrorKind::Backend
        )
    }
}

/// Result of [`Compressor::compress`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompressOutcome {
    /// Bytes written into the output buffer; always 0 for a sizing call.
    pub written: usize,
    /// Worst-case bound for a sizing call, the supplied capacity otherwise.
    pub capacity: usize,
}

/// Advisory (input, output) chunk sizes for streaming.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSizes {
    pub input: usize,
    pub output: usize,
}

impl From<BlockSizes> for (usize, usize) {
    fn from(b: BlockSizes) -> Self {
        (b.input, b.output)
    }
}

// Require Send so trait objects can cross thread boundaries.
pub trait Compressor: Send {
    /// Two-phase compress.
    ///
    /// With `output == None` nothing is transformed and the returned
    /// `capacity` is the bound for `input.len()` bytes. With a buffer the
    /// data is compressed into it and `written` is exact.
    fn compress(&mut self, input: &[u8], output: Option<&mut [u8]>) -> Result<CompressOutcome>;
}

pub trait Decompressor: Send {
    /// Decompress a complete buffer, returning the number of bytes written.
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;
}

/// Incremental encoder or decoder.
pub trait Stream: Send {
    /// Leave CREATED and allocate the backend's data-plane state.
    fn initialize(&mut self, flush: bool) -> Result<()>;

    /// Feed input and collect output. Returns `(consumed, produced)`.
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize)>;

    /// Drain pending output. Returns `(produced, more_pending)`; call again
    /// with fresh output space while `more_pending` is true.
    fn finalize(&mut self, output: &mut [u8]) -> Result<(usize, bool)>;

    fn block_sizes(&self) -> BlockSizes;

    fn state(&self) -> StreamState;

    fn counters(&self) -> &StreamCounters;
}
