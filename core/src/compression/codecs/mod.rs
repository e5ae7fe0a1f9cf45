//! compression/codecs/mod.rs
//! Backend bindings behind the block and stream capabilities.
//!
//! Industry notes:
//! - Each backend owns its parameter keys and maps them onto native setters.
//! - Block codecs reset per call; stream adapters keep state between updates.
//! - The registry turns configuration records into boxed capabilities.

pub mod brotli;
pub mod zlib;
pub mod zstd;

pub use self::brotli::{BrotliBlockBackend, BrotliCompressor, BrotliDecoder, BrotliDecompressor, BrotliEncoder};
pub use self::zlib::{ZlibBlockBackend, ZlibCompressor, ZlibDecoder, ZlibDecompressor, ZlibEncoder};
pub use self::zstd::{ZstdBlockBackend, ZstdCompressor, ZstdDecoder, ZstdDecompressor, ZstdEncoder};
