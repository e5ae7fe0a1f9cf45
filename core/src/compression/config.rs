//! compression/config.rs
//! Per-backend configuration records.
//!
//! Every field is optional: `None` keeps the backend's built-in default and
//! never reaches a native setter. Records are consumed once by a factory.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::compression::types::{Backend, CompressionError, Result};

/// Shared behaviour of all configuration records.
pub trait BackendConfig: DeserializeOwned + Serialize {
    const BACKEND: Backend;

    /// Load a record from JSON; unknown fields are rejected.
    fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| CompressionError::invalid_config(Self::BACKEND.name(), e.to_string()))
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CompressionError::invalid_config(Self::BACKEND.name(), e.to_string()))
    }
}

// --- brotli -----------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrotliCompressorConfig {
    pub quality: Option<i32>,
    pub window_size: Option<i32>,
    pub mode: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrotliDecompressorConfig {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrotliEncoderConfig {
    pub mode: Option<i32>,
    pub quality: Option<i32>,
    pub window_size: Option<i32>,
    pub block_size: Option<i32>,
    /// Bound to DISABLE_LITERAL_CONTEXT_MODELING.
    pub literal_context_modeling: Option<bool>,
    pub size_hint: Option<i32>,
    pub large_window: Option<bool>,
    pub postfix_bits: Option<i32>,
    pub num_direct_distance_codes: Option<i32>,
    pub stream_offset: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrotliDecoderConfig {
    pub disable_ring_buffer_reallocation: Option<bool>,
    pub large_window: Option<bool>,
}

// --- zlib -------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZlibCompressorConfig {
    pub level: Option<i32>,
    pub window_bits: Option<i32>,
    pub mem_level: Option<i32>,
    pub strategy: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZlibDecompressorConfig {
    pub window_bits: Option<i32>,
}

pub type ZlibEncoderConfig = ZlibCompressorConfig;
pub type ZlibDecoderConfig = ZlibDecompressorConfig;

// --- zstd -------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZstdCompressorConfig {
    pub level: Option<i32>,
    pub window_log: Option<i32>,
    pub hash_log: Option<i32>,
    pub chain_log: Option<i32>,
    pub search_log: Option<i32>,
    pub min_match: Option<i32>,
    pub target_length: Option<i32>,
    pub strategy: Option<i32>,
    pub enable_long_distance_matching: Option<bool>,
    pub enable_content_size: Option<bool>,
    pub enable_checksum: Option<bool>,
    pub enable_dict_id: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZstdDecompressorConfig {
    pub window_log_max: Option<i32>,
    pub decoder_format: Option<i32>,
    pub stable_output_buffer: Option<bool>,
    pub ignore_checksum: Option<bool>,
    pub multiple_dictionaries: Option<bool>,
    pub disable_huffman_assembly: Option<bool>,
}

pub type ZstdEncoderConfig = ZstdCompressorConfig;
pub type ZstdDecoderConfig = ZstdDecompressorConfig;

macro_rules! backend_config {
    ($backend:expr => $($ty:ty),+ $(,)?) => {
        $(impl BackendConfig for $ty {
            const BACKEND: Backend = $backend;
        })+
    };
}

backend_config!(Backend::Brotli =>
    BrotliCompressorConfig, BrotliDecompressorConfig, BrotliEncoderConfig, BrotliDecoderConfig);
backend_config!(Backend::Zlib => ZlibCompressorConfig, ZlibDecompressorConfig);
backend_config!(Backend::Zstd => ZstdCompressorConfig, ZstdDecompressorConfig);

// --- tagged records for id-based dispatch -----------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "params", rename_all = "lowercase")]
pub enum CompressorConfig {
    Brotli(BrotliCompressorConfig),
    Zlib(ZlibCompressorConfig),
    Zstd(ZstdCompressorConfig),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "params", rename_all = "lowercase")]
pub enum DecompressorConfig {
    Brotli(BrotliDecompressorConfig),
    Zlib(ZlibDecompressorConfig),
    Zstd(ZstdDecompressorConfig),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "params", rename_all = "lowercase")]
pub enum EncoderConfig {
    Brotli(BrotliEncoderConfig),
    Zlib(ZlibEncoderConfig),
    Zstd(ZstdEncoderConfig),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", content = "params", rename_all = "lowercase")]
pub enum DecoderConfig {
    Brotli(BrotliDecoderConfig),
    Zlib(ZlibDecoderConfig),
    Zstd(ZstdDecoderConfig),
}

macro_rules! tagged_config {
    ($($ty:ident),+ $(,)?) => {
        $(impl $ty {
            pub fn backend(&self) -> Backend {
                match self {
                    $ty::Brotli(_) => Backend::Brotli,
                    $ty::Zlib(_) => Backend::Zlib,
                    $ty::Zstd(_) => Backend::Zstd,
                }
            }

            /// Backend defaults for every field.
            pub fn defaults(backend: Backend) -> Self {
                match backend {
                    Backend::Brotli => $ty::Brotli(Default::default()),
                    Backend::Zlib => $ty::Zlib(Default::default()),
                    Backend::Zstd => $ty::Zstd(Default::default()),
                }
            }

            pub fn from_json(s: &str) -> Result<Self> {
                serde_json::from_str(s)
                    .map_err(|e| CompressionError::invalid_config("config", e.to_string()))
            }
        })+
    };
}

tagged_config!(CompressorConfig, DecompressorConfig, EncoderConfig, DecoderConfig);
