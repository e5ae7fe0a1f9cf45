//! src/compression/codecs/brotli.rs
//!
//! Brotli block codecs and streaming encoder/decoder over the pure Rust `brotli` crate.
//!
//! Design notes:
//! - The native setters barely validate (quality and window are taken as-is), so every
//!   integer is range-checked here before a state is created.
//! - Each block call runs a fresh encoder/decoder state; nothing survives between calls.
//! - Streams build a trial state at construction to fail fast, then rebuild on setup.
//! - Encoder states are released through `BrotliEncoderDestroyInstance` on drop.

use brotli::enc::encode::{
    BrotliEncoderCompressStream, BrotliEncoderCreateInstance, BrotliEncoderDestroyInstance,
    BrotliEncoderHasMoreOutput, BrotliEncoderIsFinished, BrotliEncoderMaxCompressedSize,
    BrotliEncoderOperation, BrotliEncoderParameter, BrotliEncoderSetParameter,
    BrotliEncoderStateStruct,
};
use brotli::enc::StandardAlloc;
use brotli::interface::{PredictionModeContextMap, StaticCommand};
use brotli::{BrotliDecompressStream, BrotliResult, BrotliState, InputPair, InputReferenceMut};

use crate::compression::block::{BlockBackend, BlockCompressor};
use crate::compression::config::{BrotliCompressorConfig, BrotliDecoderConfig, BrotliEncoderConfig};
use crate::compression::constants::*;
use crate::compression::params::{check_range, to_u32, FlagPolicy, ParamTable, ParamValue};
use crate::compression::stream::StreamAdapter;
use crate::compression::types::{Backend, CompressionError, Decompressor, Result};

const NAME: &str = "brotli";

type DecoderState = BrotliState<StandardAlloc, StandardAlloc, StandardAlloc>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BrotliParam {
    Mode,
    Quality,
    WindowSize,
    BlockSize,
    DisableLiteralContextModeling,
    SizeHint,
    LargeWindow,
    PostfixBits,
    NumDirectDistanceCodes,
    StreamOffset,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BrotliDecoderParam {
    DisableRingBufferReallocation,
    LargeWindow,
}

/// Owns one encoder state for its whole life.
struct EncoderHandle(BrotliEncoderStateStruct<StandardAlloc>);

impl EncoderHandle {
    fn create() -> Self {
        Self(BrotliEncoderCreateInstance(StandardAlloc::default()))
    }

    fn set(&mut self, param: BrotliEncoderParameter, value: u32) -> std::result::Result<(), String> {
        if BrotliEncoderSetParameter(&mut self.0, param, value) == 0 {
            return Err(format!("{param:?} refused {value}"));
        }
        Ok(())
    }

    /// One `BrotliEncoderCompressStream` call. Returns `(read, written)`.
    fn run(&mut self, op: BrotliEncoderOperation, input: &[u8], output: &mut [u8]) -> Result<(usize, usize)> {
        let mut available_in = input.len();
        let mut input_offset = 0usize;
        let mut available_out = output.len();
        let mut output_offset = 0usize;
        let mut total_out = None;
        let mut nop_callback = |_data: &mut PredictionModeContextMap<InputReferenceMut>,
                                _cmds: &mut [StaticCommand],
                                _mb: InputPair,
                                _m: &mut StandardAlloc| ();
        let ok = BrotliEncoderCompressStream(
            &mut self.0,
            op,
            &mut available_in,
            input,
            &mut input_offset,
            &mut available_out,
            output,
            &mut output_offset,
            &mut total_out,
            &mut nop_callback,
        );
        if ok == 0 {
            return Err(CompressionError::backend(NAME, "stream processing failed"));
        }
        Ok((input_offset, output_offset))
    }

    fn has_more_output(&self) -> bool {
        BrotliEncoderHasMoreOutput(&self.0) != 0
    }

    fn is_finished(&self) -> bool {
        BrotliEncoderIsFinished(&self.0) != 0
    }
}

impl Drop for EncoderHandle {
    fn drop(&mut self) {
        BrotliEncoderDestroyInstance(&mut self.0);
    }
}

fn new_decoder_state(large_window: bool) -> DecoderState {
    if large_window {
        BrotliState::new(StandardAlloc::default(), StandardAlloc::default(), StandardAlloc::default())
    } else {
        BrotliState::new_strict(StandardAlloc::default(), StandardAlloc::default(), StandardAlloc::default())
    }
}

/// One `BrotliDecompressStream` call. Returns `(read, written, result)`.
fn decode_step(state: &mut DecoderState, input: &[u8], output: &mut [u8]) -> (usize, usize, BrotliResult) {
    let mut available_in = input.len();
    let mut input_offset = 0usize;
    let mut available_out = output.len();
    let mut output_offset = 0usize;
    let mut total_out = 0usize;
    let result = BrotliDecompressStream(
        &mut available_in,
        &mut input_offset,
        input,
        &mut available_out,
        &mut output_offset,
        output,
        &mut total_out,
        state,
    );
    (input_offset, output_offset, result)
}

// ---------------------------------------------------------------------------
// Block codecs
// ---------------------------------------------------------------------------

/// One-shot brotli compression with fixed quality, window and mode.
pub struct BrotliBlockBackend {
    quality: u32,
    window_size: u32,
    mode: u32,
}

pub type BrotliCompressor = BlockCompressor<BrotliBlockBackend>;

impl BrotliBlockBackend {
    /// # Errors
    /// - `InvalidConfiguration` if quality, window size or mode is out of range.
    pub fn new(config: &BrotliCompressorConfig) -> Result<Self> {
        let quality = config.quality.unwrap_or(BROTLI_DEFAULT_QUALITY);
        let window_size = config.window_size.unwrap_or(BROTLI_DEFAULT_WINDOW);
        let mode = config.mode.unwrap_or(BROTLI_DEFAULT_MODE);

        check_range(NAME, "quality", Some(quality), BROTLI_MIN_QUALITY..=BROTLI_MAX_QUALITY)?;
        check_range(NAME, "window size", Some(window_size), BROTLI_MIN_WINDOW_BITS..=BROTLI_MAX_WINDOW_BITS)?;
        // Block codecs take generic or text only; font is left to the encoder.
        check_range(NAME, "mode", Some(mode), BROTLI_MODE_GENERIC..=BROTLI_MODE_TEXT)?;

        Ok(Self { quality: quality as u32, window_size: window_size as u32, mode: mode as u32 })
    }

    fn encoder(&self) -> Result<EncoderHandle> {
        let mut handle = EncoderHandle::create();
        ParamTable::new(NAME)
            .int(BrotliParam::Quality, Some(self.quality as i32))
            .int(BrotliParam::WindowSize, Some(self.window_size as i32))
            .int(BrotliParam::Mode, Some(self.mode as i32))
            .apply(FlagPolicy::Checked, |key, value| set_encoder_param(&mut handle, key, value))?;
        Ok(handle)
    }
}

impl BlockBackend for BrotliBlockBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compress_bound(&self, input: &[u8]) -> usize {
        BrotliEncoderMaxCompressedSize(input.len())
    }

    fn compress_data(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut handle = self.encoder()?;
        let (_, written) = handle.run(BrotliEncoderOperation::BROTLI_OPERATION_FINISH, input, output)?;
        if !handle.is_finished() {
            return Err(CompressionError::capacity(
                NAME,
                output.len(),
                Some(BrotliEncoderMaxCompressedSize(input.len())),
            ));
        }
        Ok(written)
    }
}

/// One-shot brotli decompression; takes no parameters.
#[derive(Default)]
pub struct BrotliDecompressor;

impl BrotliDecompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Decompressor for BrotliDecompressor {
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut state = new_decoder_state(true);
        let (_, written, result) = decode_step(&mut state, input, output);
        match result {
            BrotliResult::ResultSuccess => Ok(written),
            BrotliResult::NeedsMoreOutput => Err(CompressionError::capacity(NAME, output.len(), None)),
            BrotliResult::NeedsMoreInput => Err(CompressionError::corrupt(NAME, "truncated stream")),
            BrotliResult::ResultFailure => Err(CompressionError::corrupt(NAME, "decoding failed")),
        }
    }
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

fn validate_encoder(config: &BrotliEncoderConfig) -> Result<()> {
    let max_window = if config.large_window == Some(true) {
        BROTLI_LARGE_MAX_WINDOW_BITS
    } else {
        BROTLI_MAX_WINDOW_BITS
    };
    check_range(NAME, "mode", config.mode, BROTLI_MODE_GENERIC..=BROTLI_MODE_FONT)?;
    check_range(NAME, "quality", config.quality, BROTLI_MIN_QUALITY..=BROTLI_MAX_QUALITY)?;
    check_range(NAME, "window size", config.window_size, BROTLI_MIN_WINDOW_BITS..=max_window)?;
    // 0 lets the encoder pick the input block size.
    if config.block_size != Some(0) {
        check_range(
            NAME,
            "block size",
            config.block_size,
            BROTLI_MIN_INPUT_BLOCK_BITS..=BROTLI_MAX_INPUT_BLOCK_BITS,
        )?;
    }
    check_range(NAME, "size hint", config.size_hint, 0..=i32::MAX)?;
    check_range(NAME, "postfix bits", config.postfix_bits, 0..=BROTLI_MAX_NPOSTFIX)?;
    check_range(NAME, "direct distance codes", config.num_direct_distance_codes, 0..=BROTLI_MAX_NDIRECT)?;

    if let Some(ndirect) = config.num_direct_distance_codes {
        let postfix = config.postfix_bits.unwrap_or(0);
        if ((ndirect >> postfix) & 0x0f) << postfix != ndirect {
            return Err(CompressionError::invalid_config(
                NAME,
                format!("direct distance codes {ndirect} must be k << {postfix} with k <= 15"),
            ));
        }
    }
    Ok(())
}

fn encoder_table(config: &BrotliEncoderConfig) -> ParamTable<BrotliParam> {
    ParamTable::new(NAME)
        .int(BrotliParam::Mode, config.mode)
        .int(BrotliParam::Quality, config.quality)
        .int(BrotliParam::WindowSize, config.window_size)
        .int(BrotliParam::BlockSize, config.block_size)
        .flag(BrotliParam::DisableLiteralContextModeling, config.literal_context_modeling)
        .int(BrotliParam::SizeHint, config.size_hint)
        .flag(BrotliParam::LargeWindow, config.large_window)
        .int(BrotliParam::PostfixBits, config.postfix_bits)
        .int(BrotliParam::NumDirectDistanceCodes, config.num_direct_distance_codes)
        .int(BrotliParam::StreamOffset, config.stream_offset)
}

fn set_encoder_param(handle: &mut EncoderHandle, key: BrotliParam, value: ParamValue) -> std::result::Result<(), String> {
    let v = to_u32(value.as_native())?;
    match key {
        BrotliParam::Mode => handle.set(BrotliEncoderParameter::BROTLI_PARAM_MODE, v),
        BrotliParam::Quality => handle.set(BrotliEncoderParameter::BROTLI_PARAM_QUALITY, v),
        BrotliParam::WindowSize => handle.set(BrotliEncoderParameter::BROTLI_PARAM_LGWIN, v),
        BrotliParam::BlockSize => handle.set(BrotliEncoderParameter::BROTLI_PARAM_LGBLOCK, v),
        BrotliParam::DisableLiteralContextModeling => {
            handle.set(BrotliEncoderParameter::BROTLI_PARAM_DISABLE_LITERAL_CONTEXT_MODELING, v)
        }
        BrotliParam::SizeHint => handle.set(BrotliEncoderParameter::BROTLI_PARAM_SIZE_HINT, v),
        BrotliParam::LargeWindow => handle.set(BrotliEncoderParameter::BROTLI_PARAM_LARGE_WINDOW, v),
        // No dedicated setter in the Rust encoder; the distance params are read at first use.
        BrotliParam::PostfixBits => {
            handle.0.params.dist.distance_postfix_bits = v;
            Ok(())
        }
        BrotliParam::NumDirectDistanceCodes => {
            handle.0.params.dist.num_direct_distance_codes = v;
            Ok(())
        }
        BrotliParam::StreamOffset if v == 0 => Ok(()),
        BrotliParam::StreamOffset => Err(format!("stream offset {v} is not supported by this encoder")),
    }
}

fn build_encoder(config: &BrotliEncoderConfig) -> Result<EncoderHandle> {
    let mut handle = EncoderHandle::create();
    encoder_table(config).apply(FlagPolicy::Checked, |key, value| set_encoder_param(&mut handle, key, value))?;
    Ok(handle)
}

/// Streaming brotli encoder hooks.
pub struct BrotliEncoder {
    config: BrotliEncoderConfig,
    handle: Option<EncoderHandle>,
}

impl BrotliEncoder {
    pub fn new(config: &BrotliEncoderConfig) -> Result<Self> {
        validate_encoder(config)?;
        drop(build_encoder(config)?);
        Ok(Self { config: config.clone(), handle: None })
    }

    fn handle(&mut self) -> Result<&mut EncoderHandle> {
        self.handle
            .as_mut()
            .ok_or_else(|| CompressionError::backend(NAME, "stream used before setup"))
    }
}

impl StreamAdapter for BrotliEncoder {
    fn backend(&self) -> Backend {
        Backend::Brotli
    }

    fn setup(&mut self) -> Result<()> {
        self.handle = Some(build_encoder(&self.config)?);
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8], flush: bool) -> Result<(usize, usize)> {
        let op = if flush {
            BrotliEncoderOperation::BROTLI_OPERATION_FLUSH
        } else {
            BrotliEncoderOperation::BROTLI_OPERATION_PROCESS
        };
        let handle = self.handle()?;
        // An unfinished flush refuses new input until its output is drained.
        if flush && handle.has_more_output() {
            return handle.run(op, &[], output);
        }
        handle.run(op, input, output)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        let handle = self.handle()?;
        let (_, written) = handle.run(BrotliEncoderOperation::BROTLI_OPERATION_FINISH, &[], output)?;
        Ok((written, !handle.is_finished()))
    }

    fn input_block_size(&self) -> usize {
        BROTLI_INPUT_BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        BROTLI_OUTPUT_BLOCK_SIZE
    }
}

/// Streaming brotli decoder hooks.
pub struct BrotliDecoder {
    large_window: bool,
    state: Option<DecoderState>,
    finished: bool,
}

impl BrotliDecoder {
    pub fn new(config: &BrotliDecoderConfig) -> Result<Self> {
        let mut large_window = false;
        ParamTable::new(NAME)
            .flag(BrotliDecoderParam::DisableRingBufferReallocation, config.disable_ring_buffer_reallocation)
            .flag(BrotliDecoderParam::LargeWindow, config.large_window)
            .apply(FlagPolicy::Checked, |key, value| {
                match key {
                    BrotliDecoderParam::LargeWindow => large_window = value.as_native() != 0,
                    // The Rust decoder sizes its ring buffer once per stream.
                    BrotliDecoderParam::DisableRingBufferReallocation => {}
                }
                Ok(())
            })?;
        Ok(Self { large_window, state: None, finished: false })
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize, BrotliResult)> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| CompressionError::backend(NAME, "stream used before setup"))?;
        let (read, written, result) = decode_step(state, input, output);
        match result {
            BrotliResult::ResultFailure => Err(CompressionError::corrupt(NAME, "stream processing failed")),
            BrotliResult::ResultSuccess => {
                self.finished = true;
                Ok((read, written, result))
            }
            _ => Ok((read, written, result)),
        }
    }
}

impl StreamAdapter for BrotliDecoder {
    fn backend(&self) -> Backend {
        Backend::Brotli
    }

    fn setup(&mut self) -> Result<()> {
        self.state = Some(new_decoder_state(self.large_window));
        self.finished = false;
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8], _flush: bool) -> Result<(usize, usize)> {
        if self.finished {
            if input.is_empty() {
                return Ok((0, 0));
            }
            return Err(CompressionError::corrupt(NAME, "data after end of stream"));
        }
        let (read, written, _) = self.step(input, output)?;
        Ok((read, written))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        if self.finished {
            return Ok((0, false));
        }
        let (_, written, result) = self.step(&[], output)?;
        match result {
            BrotliResult::ResultSuccess => Ok((written, false)),
            BrotliResult::NeedsMoreOutput => Ok((written, true)),
            _ => Err(CompressionError::corrupt(NAME, "stream ended before its last block")),
        }
    }

    fn input_block_size(&self) -> usize {
        BROTLI_INPUT_BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        BROTLI_OUTPUT_BLOCK_SIZE
    }
}
