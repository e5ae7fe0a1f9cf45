//! compress-core
//!
//! One interface over brotli, zlib and zstd: one-shot block codecs and
//! incremental streams with an explicit lifecycle.

#![forbid(unsafe_code)]

pub mod utils;

pub mod compression;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::config::{
        BrotliCompressorConfig, BrotliDecoderConfig, BrotliDecompressorConfig, BrotliEncoderConfig,
        CompressorConfig, DecoderConfig, DecompressorConfig, EncoderConfig, ZlibCompressorConfig,
        ZlibDecoderConfig, ZlibDecompressorConfig, ZlibEncoderConfig, ZstdCompressorConfig,
        ZstdDecoderConfig, ZstdDecompressorConfig, ZstdEncoderConfig,
    };
    pub use crate::compression::registry::*;
    pub use crate::compression::stream::{drive_stream, drive_stream_with};
    pub use crate::compression::types::{
        Backend, BlockSizes, CompressOutcome, CompressionError, Compressor, Decompressor, ErrorKind,
        Stream, StreamState,
    };
    pub use crate::compression::block::{compress_to_vec, decompress_to_vec};
    pub use crate::telemetry::{StreamCounters, StreamSnapshot};
}
