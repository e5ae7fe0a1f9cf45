//! src/compression/codecs/zstd.rs
//!
//! Zstd block codecs and streaming encoder/decoder.
//!
//! Design notes:
//! - Block codecs hold one CCtx/DCtx each and reset the session before every call.
//! - `compress2` honours every parameter applied to the context (level included).
//! - Streams wrap `zstd::stream::raw` operations; setup builds a fresh context.
//! - Flag setters are best-effort: a refused flag is logged and ignored.
//! - Integer parameters are unsigned natively; negative values are refused.

use zstd::stream::raw::{Decoder as RawDecoder, Encoder as RawEncoder, InBuffer, Operation, OutBuffer};
use zstd_safe::{CCtx, CParameter, DCtx, DParameter, ResetDirective, Strategy};

use crate::compression::block::{BlockBackend, BlockCompressor};
use crate::compression::config::{ZstdCompressorConfig, ZstdDecompressorConfig, ZstdDecoderConfig, ZstdEncoderConfig};
use crate::compression::constants::{
    ZSTD_DECODER_FORMAT_RANGE, ZSTD_DEFAULT_STRATEGY, ZSTD_DST_TOO_SMALL, ZSTD_STRATEGY_RANGE,
};
use crate::compression::params::{check_range, to_u32, FlagPolicy, ParamTable, ParamValue};
use crate::compression::stream::StreamAdapter;
use crate::compression::types::{Backend, CompressionError, Decompressor, Result};
use crate::utils::in_range;

const NAME: &str = "zstd";

/// Symbolic zstd parameters bound from configuration records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZstdParam {
    Level,
    WindowLog,
    HashLog,
    ChainLog,
    SearchLog,
    MinMatch,
    TargetLength,
    Strategy,
    LongDistanceMatching,
    ContentSize,
    Checksum,
    DictId,
    WindowLogMax,
    DecoderFormat,
    StableOutputBuffer,
    IgnoreChecksum,
    MultipleDictionaries,
    DisableHuffmanAssembly,
}

fn compressor_table(cfg: &ZstdCompressorConfig) -> ParamTable<ZstdParam> {
    ParamTable::new(NAME)
        .int(ZstdParam::Level, cfg.level)
        .int(ZstdParam::WindowLog, cfg.window_log)
        .int(ZstdParam::HashLog, cfg.hash_log)
        .int(ZstdParam::ChainLog, cfg.chain_log)
        .int(ZstdParam::SearchLog, cfg.search_log)
        .int(ZstdParam::MinMatch, cfg.min_match)
        .int(ZstdParam::TargetLength, cfg.target_length)
        .int(ZstdParam::Strategy, cfg.strategy)
        .flag(ZstdParam::LongDistanceMatching, cfg.enable_long_distance_matching)
        .flag(ZstdParam::ContentSize, cfg.enable_content_size)
        .flag(ZstdParam::Checksum, cfg.enable_checksum)
        .flag(ZstdParam::DictId, cfg.enable_dict_id)
}

fn decompressor_table(cfg: &ZstdDecompressorConfig) -> ParamTable<ZstdParam> {
    ParamTable::new(NAME)
        .int(ZstdParam::WindowLogMax, cfg.window_log_max)
        .int(ZstdParam::DecoderFormat, cfg.decoder_format)
        .flag(ZstdParam::StableOutputBuffer, cfg.stable_output_buffer)
        .flag(ZstdParam::IgnoreChecksum, cfg.ignore_checksum)
        .flag(ZstdParam::MultipleDictionaries, cfg.multiple_dictionaries)
        .flag(ZstdParam::DisableHuffmanAssembly, cfg.disable_huffman_assembly)
}

fn strategy_from(value: i32) -> std::result::Result<Strategy, String> {
    let strategy = match value {
        1 => Strategy::ZSTD_fast,
        2 => Strategy::ZSTD_dfast,
        3 => Strategy::ZSTD_greedy,
        4 => Strategy::ZSTD_lazy,
        5 => Strategy::ZSTD_lazy2,
        6 => Strategy::ZSTD_btlazy2,
        7 => Strategy::ZSTD_btopt,
        8 => Strategy::ZSTD_btultra,
        9 => Strategy::ZSTD_btultra2,
        other => {
            return Err(format!(
                "strategy {other} outside {}..={}",
                ZSTD_STRATEGY_RANGE.start(),
                ZSTD_STRATEGY_RANGE.end()
            ))
        }
    };
    Ok(strategy)
}

/// Map a table entry onto a native compression parameter.
/// `Ok(None)` keeps the library default.
fn cparameter(key: ZstdParam, value: ParamValue) -> std::result::Result<Option<CParameter>, String> {
    let v = value.as_native();
    let flag = v != 0;
    let param = match key {
        ZstdParam::Level => CParameter::CompressionLevel(v),
        ZstdParam::WindowLog => CParameter::WindowLog(to_u32(v)?),
        ZstdParam::HashLog => CParameter::HashLog(to_u32(v)?),
        ZstdParam::ChainLog => CParameter::ChainLog(to_u32(v)?),
        ZstdParam::SearchLog => CParameter::SearchLog(to_u32(v)?),
        ZstdParam::MinMatch => CParameter::MinMatch(to_u32(v)?),
        ZstdParam::TargetLength => CParameter::TargetLength(to_u32(v)?),
        ZstdParam::Strategy if v == ZSTD_DEFAULT_STRATEGY => return Ok(None),
        ZstdParam::Strategy => CParameter::Strategy(strategy_from(v)?),
        ZstdParam::LongDistanceMatching => CParameter::EnableLongDistanceMatching(flag),
        ZstdParam::ContentSize => CParameter::ContentSizeFlag(flag),
        ZstdParam::Checksum => CParameter::ChecksumFlag(flag),
        ZstdParam::DictId => CParameter::DictIdFlag(flag),
        other => return Err(format!("{other:?} is not a compression parameter")),
    };
    Ok(Some(param))
}

/// Map a table entry onto a native decompression parameter.
/// `Ok(None)` means the value is valid but this build has no setter for it.
fn dparameter(key: ZstdParam, value: ParamValue) -> std::result::Result<Option<DParameter>, String> {
    match key {
        ZstdParam::WindowLogMax => Ok(Some(DParameter::WindowLogMax(to_u32(value.as_native())?))),
        ZstdParam::DecoderFormat => {
            let v = value.as_native();
            if !in_range(v, &ZSTD_DECODER_FORMAT_RANGE) {
                return Err(format!(
                    "decoder format {v} outside {}..={}",
                    ZSTD_DECODER_FORMAT_RANGE.start(),
                    ZSTD_DECODER_FORMAT_RANGE.end()
                ));
            }
            tracing::warn!(backend = NAME, param = ?key, %value, "no native setter in this zstd build; ignored");
            Ok(None)
        }
        other => Err(format!("{other:?} is not supported by this zstd build")),
    }
}

fn error_name(code: usize) -> String {
    zstd_safe::get_error_name(code).to_string()
}

fn op_err(e: std::io::Error) -> CompressionError {
    CompressionError::backend(NAME, e.to_string())
}

// ---------------------------------------------------------------------------
// Block codecs
// ---------------------------------------------------------------------------

/// One-shot zstd compression over a configured CCtx.
pub struct ZstdBlockBackend {
    cctx: CCtx<'static>,
}

pub type ZstdCompressor = BlockCompressor<ZstdBlockBackend>;

impl ZstdBlockBackend {
    /// # Errors
    /// - `InvalidConfiguration` if any integer parameter is refused.
    pub fn new(config: &ZstdCompressorConfig) -> Result<Self> {
        check_range(NAME, "strategy", config.strategy.filter(|s| *s != ZSTD_DEFAULT_STRATEGY), ZSTD_STRATEGY_RANGE)?;
        let mut cctx = CCtx::try_create()
            .ok_or_else(|| CompressionError::backend(NAME, "context allocation failed"))?;
        compressor_table(config).apply(FlagPolicy::BestEffort, |key, value| {
            match cparameter(key, value)? {
                Some(p) => cctx.set_parameter(p).map(|_| ()).map_err(error_name),
                None => Ok(()),
            }
        })?;
        Ok(Self { cctx })
    }
}

impl BlockBackend for ZstdBlockBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compress_bound(&self, input: &[u8]) -> usize {
        zstd_safe::compress_bound(input.len())
    }

    fn compress_data(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let capacity = output.len();
        self.cctx
            .reset(ResetDirective::SessionOnly)
            .map_err(|code| CompressionError::backend(NAME, error_name(code)))?;
        self.cctx.compress2(output, input).map_err(|code| {
            let name = zstd_safe::get_error_name(code);
            if name == ZSTD_DST_TOO_SMALL {
                CompressionError::capacity(NAME, capacity, Some(zstd_safe::compress_bound(input.len())))
            } else {
                CompressionError::backend(NAME, name)
            }
        })
    }
}

/// One-shot zstd decompression over a configured DCtx.
pub struct ZstdDecompressor {
    dctx: DCtx<'static>,
}

impl ZstdDecompressor {
    pub fn new(config: &ZstdDecompressorConfig) -> Result<Self> {
        let mut dctx = DCtx::try_create()
            .ok_or_else(|| CompressionError::backend(NAME, "context allocation failed"))?;
        decompressor_table(config).apply(FlagPolicy::BestEffort, |key, value| {
            match dparameter(key, value)? {
                Some(p) => dctx.set_parameter(p).map(|_| ()).map_err(error_name),
                None => Ok(()),
            }
        })?;
        Ok(Self { dctx })
    }
}

impl Decompressor for ZstdDecompressor {
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let capacity = output.len();
        self.dctx
            .reset(ResetDirective::SessionOnly)
            .map_err(|code| CompressionError::backend(NAME, error_name(code)))?;
        self.dctx.decompress(output, input).map_err(|code| {
            let name = zstd_safe::get_error_name(code);
            if name == ZSTD_DST_TOO_SMALL {
                CompressionError::capacity(NAME, capacity, None)
            } else {
                CompressionError::corrupt(NAME, name)
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

fn build_encoder(config: &ZstdEncoderConfig) -> Result<RawEncoder<'static>> {
    check_range(NAME, "strategy", config.strategy.filter(|s| *s != ZSTD_DEFAULT_STRATEGY), ZSTD_STRATEGY_RANGE)?;
    let mut encoder = RawEncoder::new(0).map_err(op_err)?;
    compressor_table(config).apply(FlagPolicy::BestEffort, |key, value| {
        match cparameter(key, value)? {
            Some(p) => encoder.set_parameter(p).map_err(|e| e.to_string()),
            None => Ok(()),
        }
    })?;
    Ok(encoder)
}

fn build_decoder(config: &ZstdDecoderConfig) -> Result<RawDecoder<'static>> {
    let mut decoder = RawDecoder::new().map_err(op_err)?;
    decompressor_table(config).apply(FlagPolicy::BestEffort, |key, value| {
        match dparameter(key, value)? {
            Some(p) => decoder.set_parameter(p).map_err(|e| e.to_string()),
            None => Ok(()),
        }
    })?;
    Ok(decoder)
}

fn not_initialized() -> CompressionError {
    CompressionError::backend(NAME, "stream context missing; setup was not run")
}

/// Streaming zstd encoder hooks.
pub struct ZstdEncoder {
    config: ZstdEncoderConfig,
    encoder: Option<RawEncoder<'static>>,
    // A flush that ran out of output space; drained before new input.
    flush_pending: bool,
}

impl ZstdEncoder {
    /// Builds and drops a trial context so bad parameters fail here.
    pub fn new(config: &ZstdEncoderConfig) -> Result<Self> {
        drop(build_encoder(config)?);
        Ok(Self { config: config.clone(), encoder: None, flush_pending: false })
    }
}

impl StreamAdapter for ZstdEncoder {
    fn backend(&self) -> Backend {
        Backend::Zstd
    }

    fn setup(&mut self) -> Result<()> {
        self.encoder = Some(build_encoder(&self.config)?);
        self.flush_pending = false;
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8], flush: bool) -> Result<(usize, usize)> {
        let encoder = self.encoder.as_mut().ok_or_else(not_initialized)?;
        let mut out = OutBuffer::around(output);

        if self.flush_pending {
            let remaining = encoder.flush(&mut out).map_err(op_err)?;
            self.flush_pending = remaining > 0;
            return Ok((0, out.pos()));
        }

        let mut inb = InBuffer::around(input);
        encoder.run(&mut inb, &mut out).map_err(op_err)?;
        if flush {
            let remaining = encoder.flush(&mut out).map_err(op_err)?;
            self.flush_pending = remaining > 0;
        }
        Ok((inb.pos(), out.pos()))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        let encoder = self.encoder.as_mut().ok_or_else(not_initialized)?;
        let mut out = OutBuffer::around(output);

        if self.flush_pending {
            let remaining = encoder.flush(&mut out).map_err(op_err)?;
            self.flush_pending = remaining > 0;
            if self.flush_pending {
                return Ok((out.pos(), true));
            }
        }

        let remaining = encoder.finish(&mut out, true).map_err(op_err)?;
        Ok((out.pos(), remaining > 0))
    }

    fn input_block_size(&self) -> usize {
        CCtx::in_size()
    }

    fn output_block_size(&self) -> usize {
        CCtx::out_size()
    }
}

/// Streaming zstd decoder hooks.
pub struct ZstdDecoder {
    config: ZstdDecoderConfig,
    decoder: Option<RawDecoder<'static>>,
    // Last hint from the library; 0 means a frame just completed.
    hint: usize,
}

impl ZstdDecoder {
    pub fn new(config: &ZstdDecoderConfig) -> Result<Self> {
        drop(build_decoder(config)?);
        Ok(Self { config: config.clone(), decoder: None, hint: 0 })
    }
}

impl StreamAdapter for ZstdDecoder {
    fn backend(&self) -> Backend {
        Backend::Zstd
    }

    fn setup(&mut self) -> Result<()> {
        self.decoder = Some(build_decoder(&self.config)?);
        // Nothing decoded yet, so an immediate finish is a truncated stream.
        self.hint = 1;
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8], _flush: bool) -> Result<(usize, usize)> {
        let decoder = self.decoder.as_mut().ok_or_else(not_initialized)?;
        let mut inb = InBuffer::around(input);
        let mut out = OutBuffer::around(output);
        self.hint = decoder
            .run(&mut inb, &mut out)
            .map_err(|e| CompressionError::corrupt(NAME, e.to_string()))?;
        Ok((inb.pos(), out.pos()))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        // A zero hint means the last frame is decoded and fully flushed.
        if self.hint == 0 {
            return Ok((0, false));
        }
        let decoder = self.decoder.as_mut().ok_or_else(not_initialized)?;
        let capacity = output.len();
        let mut out = OutBuffer::around(output);
        self.hint = decoder
            .run(&mut InBuffer::around(&[]), &mut out)
            .map_err(|e| CompressionError::corrupt(NAME, e.to_string()))?;
        let written = out.pos();

        if self.hint == 0 {
            Ok((written, false))
        } else if capacity > 0 && written == capacity {
            Ok((written, true))
        } else {
            Err(CompressionError::corrupt(NAME, "stream ended inside a frame"))
        }
    }

    fn input_block_size(&self) -> usize {
        DCtx::in_size()
    }

    fn output_block_size(&self) -> usize {
        DCtx::out_size()
    }
}
