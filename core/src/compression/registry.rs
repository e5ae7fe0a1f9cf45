//! compression/registry.rs
//! Backend registry and factory functions.
//!
//! One factory per backend and direction. Each validates its record, builds the
//! native state and hands back a boxed capability; nothing is returned on failure.

use crate::compression::block::BlockCompressor;
use crate::compression::codecs::{brotli, zlib, zstd};
use crate::compression::config::*;
use crate::compression::constants::*;
use crate::compression::stream::StreamController;
use crate::compression::types::{Backend, Compressor, Decompressor, Result, Stream};

pub struct BackendInfo {
    pub backend: Backend,
    pub name: &'static str,
    /// True when a refused flag fails construction.
    pub checked_flags: bool,
    pub default_level: i32,
}

pub fn resolve(backend_id: u16) -> Result<BackendInfo> {
    let backend = Backend::from_id(backend_id)?;
    Ok(match backend {
        Backend::Brotli => BackendInfo { backend, name: "brotli", checked_flags: true, default_level: BROTLI_DEFAULT_QUALITY },
        Backend::Zlib => BackendInfo { backend, name: "zlib", checked_flags: true, default_level: ZLIB_DEFAULT_LEVEL },
        Backend::Zstd => BackendInfo { backend, name: "zstd", checked_flags: false, default_level: zstd_safe::CLEVEL_DEFAULT },
    })
}

// --- brotli -----------------------------------------------------------------

pub fn create_brotli_compressor(config: &BrotliCompressorConfig) -> Result<Box<dyn Compressor>> {
    let backend = brotli::BrotliBlockBackend::new(config)?;
    tracing::debug!(?config, "brotli compressor created");
    Ok(Box::new(BlockCompressor::new(backend)))
}

pub fn create_brotli_decompressor(_config: &BrotliDecompressorConfig) -> Result<Box<dyn Decompressor>> {
    tracing::debug!("brotli decompressor created");
    Ok(Box::new(brotli::BrotliDecompressor::new()))
}

pub fn create_brotli_encoder(config: &BrotliEncoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = brotli::BrotliEncoder::new(config)?;
    tracing::debug!(?config, "brotli encoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

pub fn create_brotli_decoder(config: &BrotliDecoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = brotli::BrotliDecoder::new(config)?;
    tracing::debug!(?config, "brotli decoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

// --- zlib -------------------------------------------------------------------

pub fn create_zlib_compressor(config: &ZlibCompressorConfig) -> Result<Box<dyn Compressor>> {
    let backend = zlib::ZlibBlockBackend::new(config)?;
    tracing::debug!(?config, "zlib compressor created");
    Ok(Box::new(BlockCompressor::new(backend)))
}

pub fn create_zlib_decompressor(config: &ZlibDecompressorConfig) -> Result<Box<dyn Decompressor>> {
    let decompressor = zlib::ZlibDecompressor::new(config)?;
    tracing::debug!(?config, "zlib decompressor created");
    Ok(Box::new(decompressor))
}

pub fn create_zlib_encoder(config: &ZlibEncoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = zlib::ZlibEncoder::new(config)?;
    tracing::debug!(?config, "zlib encoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

pub fn create_zlib_decoder(config: &ZlibDecoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = zlib::ZlibDecoder::new(config)?;
    tracing::debug!(?config, "zlib decoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

// --- zstd -------------------------------------------------------------------

pub fn create_zstd_compressor(config: &ZstdCompressorConfig) -> Result<Box<dyn Compressor>> {
    let backend = zstd::ZstdBlockBackend::new(config)?;
    tracing::debug!(?config, "zstd compressor created");
    Ok(Box::new(BlockCompressor::new(backend)))
}

pub fn create_zstd_decompressor(config: &ZstdDecompressorConfig) -> Result<Box<dyn Decompressor>> {
    let decompressor = zstd::ZstdDecompressor::new(config)?;
    tracing::debug!(?config, "zstd decompressor created");
    Ok(Box::new(decompressor))
}

pub fn create_zstd_encoder(config: &ZstdEncoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = zstd::ZstdEncoder::new(config)?;
    tracing::debug!(?config, "zstd encoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

pub fn create_zstd_decoder(config: &ZstdDecoderConfig) -> Result<Box<dyn Stream>> {
    let adapter = zstd::ZstdDecoder::new(config)?;
    tracing::debug!(?config, "zstd decoder created");
    Ok(Box::new(StreamController::new(adapter)))
}

// --- tagged dispatch --------------------------------------------------------

pub fn create_compressor(config: &CompressorConfig) -> Result<Box<dyn Compressor>> {
    match config {
        CompressorConfig::Brotli(c) => create_brotli_compressor(c),
        CompressorConfig::Zlib(c) => create_zlib_compressor(c),
        CompressorConfig::Zstd(c) => create_zstd_compressor(c),
    }
}

pub fn create_decompressor(config: &DecompressorConfig) -> Result<Box<dyn Decompressor>> {
    match config {
        DecompressorConfig::Brotli(c) => create_brotli_decompressor(c),
        DecompressorConfig::Zlib(c) => create_zlib_decompressor(c),
        DecompressorConfig::Zstd(c) => create_zstd_decompressor(c),
    }
}

pub fn create_encoder(config: &EncoderConfig) -> Result<Box<dyn Stream>> {
    match config {
        EncoderConfig::Brotli(c) => create_brotli_encoder(c),
        EncoderConfig::Zlib(c) => create_zlib_encoder(c),
        EncoderConfig::Zstd(c) => create_zstd_encoder(c),
    }
}

pub fn create_decoder(config: &DecoderConfig) -> Result<Box<dyn Stream>> {
    match config {
        DecoderConfig::Brotli(c) => create_brotli_decoder(c),
        DecoderConfig::Zlib(c) => create_zlib_decoder(c),
        DecoderConfig::Zstd(c) => create_zstd_decoder(c),
    }
}
