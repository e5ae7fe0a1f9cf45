//! compression/constants.rs
//! Stable backend IDs, defaults and legal parameter ranges.

use std::ops::RangeInclusive;

/// Stable backend IDs (u16) for configuration files and dispatch.
pub mod backend_ids {
    pub const BROTLI: u16 = 0x0001;
    pub const ZLIB: u16   = 0x0002;
    pub const ZSTD: u16   = 0x0003;
}

// --- brotli -----------------------------------------------------------------

pub const BROTLI_MIN_QUALITY: i32 = 0;
pub const BROTLI_MAX_QUALITY: i32 = 11;
pub const BROTLI_DEFAULT_QUALITY: i32 = 11;

pub const BROTLI_MIN_WINDOW_BITS: i32 = 10;
pub const BROTLI_MAX_WINDOW_BITS: i32 = 24;
/// Upper bound once the large-window extension is enabled.
pub const BROTLI_LARGE_MAX_WINDOW_BITS: i32 = 30;
pub const BROTLI_DEFAULT_WINDOW: i32 = 22;

pub const BROTLI_MODE_GENERIC: i32 = 0;
pub const BROTLI_MODE_TEXT: i32 = 1;
pub const BROTLI_MODE_FONT: i32 = 2;
pub const BROTLI_DEFAULT_MODE: i32 = BROTLI_MODE_GENERIC;

pub const BROTLI_MIN_INPUT_BLOCK_BITS: i32 = 16;
pub const BROTLI_MAX_INPUT_BLOCK_BITS: i32 = 24;

pub const BROTLI_MAX_NPOSTFIX: i32 = 3;
pub const BROTLI_MAX_NDIRECT: i32 = 120;

pub const BROTLI_INPUT_BLOCK_SIZE: usize = 16000;
pub const BROTLI_OUTPUT_BLOCK_SIZE: usize = 16000;

// --- zlib -------------------------------------------------------------------

/// `-1` selects the library default (6).
pub const ZLIB_LEVEL_RANGE: RangeInclusive<i32> = -1..=9;
pub const ZLIB_DEFAULT_LEVEL: i32 = -1;
pub const ZLIB_DEFAULT_WINDOW_BITS: i32 = 15;
pub const ZLIB_MEM_LEVEL_RANGE: RangeInclusive<i32> = 1..=9;
pub const ZLIB_DEFAULT_MEM_LEVEL: i32 = 8;
/// Z_DEFAULT_STRATEGY ..= Z_FIXED
pub const ZLIB_STRATEGY_RANGE: RangeInclusive<i32> = 0..=4;
pub const ZLIB_DEFAULT_STRATEGY: i32 = 0;

/// Window bits with a zlib header.
pub const ZLIB_WRAPPED_BITS: RangeInclusive<i32> = 9..=15;
/// Negative window bits select a raw deflate stream.
pub const ZLIB_RAW_BITS: RangeInclusive<i32> = -15..=-9;
/// Window bits + 16 select a gzip wrapper.
pub const ZLIB_GZIP_BITS: RangeInclusive<i32> = 25..=31;

pub const ZLIB_INPUT_BLOCK_SIZE: usize = 16 * 1024;
pub const ZLIB_OUTPUT_BLOCK_SIZE: usize = 16 * 1024;

// --- zstd -------------------------------------------------------------------

/// `0` asks zstd for its built-in strategy for the selected level.
pub const ZSTD_DEFAULT_STRATEGY: i32 = 0;
pub const ZSTD_STRATEGY_RANGE: RangeInclusive<i32> = 1..=9;
// ZSTD_f_zstd1, ZSTD_f_zstd1_magicless
pub const ZSTD_DECODER_FORMAT_RANGE: RangeInclusive<i32> = 0..=1;

/// Error name libzstd reports for `dstSize_tooSmall`.
pub const ZSTD_DST_TOO_SMALL: &str = "Destination buffer is too small";
