//! Zlib (deflate with zlib, raw or gzip wrapper) via flate2.
//!
//! Design notes:
//! - `window_bits` follows zlib's convention: 9..=15 zlib, -15..=-9 raw, 25..=31 gzip.
//! - flate2 panics on out-of-range window bits, so every value is checked before
//!   a native stream is created.
//! - flate2 exposes no memLevel/strategy knobs; both are range-checked and logged.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::compression::block::{BlockBackend, BlockCompressor};
use crate::compression::config::{ZlibCompressorConfig, ZlibDecompressorConfig, ZlibDecoderConfig, ZlibEncoderConfig};
use crate::compression::constants::*;
use crate::compression::params::{FlagPolicy, ParamTable};
use crate::compression::stream::StreamAdapter;
use crate::compression::types::{Backend, CompressionError, Decompressor, Result};
use crate::utils::in_range;

const NAME: &str = "zlib";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZlibParam {
    Level,
    WindowBits,
    MemLevel,
    Strategy,
}

/// Container format selected by `window_bits`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZlibFormat {
    Zlib,
    Raw,
    Gzip,
}

/// Parsed window bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZlibWindow {
    pub format: ZlibFormat,
    pub bits: u8,
}

impl ZlibWindow {
    pub fn parse(window_bits: i32) -> std::result::Result<Self, String> {
        let (format, bits) = if in_range(window_bits, &ZLIB_WRAPPED_BITS) {
            (ZlibFormat::Zlib, window_bits)
        } else if in_range(window_bits, &ZLIB_RAW_BITS) {
            (ZlibFormat::Raw, -window_bits)
        } else if in_range(window_bits, &ZLIB_GZIP_BITS) {
            (ZlibFormat::Gzip, window_bits - 16)
        } else {
            return Err(format!(
                "window_bits {window_bits} is not in 9..=15, -15..=-9 or 25..=31"
            ));
        };
        Ok(Self { format, bits: bits as u8 })
    }

    /// Header plus trailer bytes the wrapper adds.
    fn wrapper_len(self) -> usize {
        match self.format {
            ZlibFormat::Zlib => 6,
            ZlibFormat::Raw => 0,
            ZlibFormat::Gzip => 18,
        }
    }

    fn compress(self, level: Compression) -> Compress {
        match self.format {
            ZlibFormat::Zlib => Compress::new_with_window_bits(level, true, self.bits),
            ZlibFormat::Raw => Compress::new_with_window_bits(level, false, self.bits),
            ZlibFormat::Gzip => Compress::new_gzip(level, self.bits),
        }
    }

    fn decompress(self) -> Decompress {
        match self.format {
            ZlibFormat::Zlib => Decompress::new_with_window_bits(true, self.bits),
            ZlibFormat::Raw => Decompress::new_with_window_bits(false, self.bits),
            ZlibFormat::Gzip => Decompress::new_gzip(self.bits),
        }
    }
}

/// Validated deflate settings, filled in by the parameter binder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZlibSettings {
    pub level: Compression,
    pub window: ZlibWindow,
    pub mem_level: i32,
    pub strategy: i32,
}

impl Default for ZlibSettings {
    fn default() -> Self {
        Self {
            level: Compression::default(),
            window: ZlibWindow { format: ZlibFormat::Zlib, bits: ZLIB_DEFAULT_WINDOW_BITS as u8 },
            mem_level: ZLIB_DEFAULT_MEM_LEVEL,
            strategy: ZLIB_DEFAULT_STRATEGY,
        }
    }
}

impl ZlibSettings {
    /// # Errors
    /// - `InvalidConfiguration` for the first field outside its legal range.
    pub fn from_config(config: &ZlibCompressorConfig) -> Result<Self> {
        let mut settings = Self::default();
        ParamTable::new(NAME)
            .int(ZlibParam::Level, config.level)
            .int(ZlibParam::WindowBits, config.window_bits)
            .int(ZlibParam::MemLevel, config.mem_level)
            .int(ZlibParam::Strategy, config.strategy)
            .apply(FlagPolicy::Checked, |key, value| settings.set(key, value.as_native()))?;

        if settings.mem_level != ZLIB_DEFAULT_MEM_LEVEL || settings.strategy != ZLIB_DEFAULT_STRATEGY {
            tracing::debug!(
                mem_level = settings.mem_level,
                strategy = settings.strategy,
                "zlib memory level and strategy use library defaults"
            );
        }
        Ok(settings)
    }

    fn set(&mut self, key: ZlibParam, value: i32) -> std::result::Result<(), String> {
        match key {
            ZlibParam::Level => {
                if !in_range(value, &ZLIB_LEVEL_RANGE) {
                    return Err(format!("level {value} outside -1..=9"));
                }
                self.level = if value < 0 { Compression::default() } else { Compression::new(value as u32) };
            }
            ZlibParam::WindowBits => self.window = ZlibWindow::parse(value)?,
            ZlibParam::MemLevel => {
                if !in_range(value, &ZLIB_MEM_LEVEL_RANGE) {
                    return Err(format!("mem_level {value} outside 1..=9"));
                }
                self.mem_level = value;
            }
            ZlibParam::Strategy => {
                if !in_range(value, &ZLIB_STRATEGY_RANGE) {
                    return Err(format!("strategy {value} outside 0..=4"));
                }
                self.strategy = value;
            }
        }
        Ok(())
    }

    /// Conservative deflate bound for any window and memory level.
    pub fn bound(&self, len: usize) -> usize {
        len + ((len + 7) >> 3) + ((len + 63) >> 6) + 5 + self.window.wrapper_len()
    }
}

fn decoder_window(window_bits: Option<i32>) -> Result<ZlibWindow> {
    let mut window = ZlibWindow { format: ZlibFormat::Zlib, bits: ZLIB_DEFAULT_WINDOW_BITS as u8 };
    ParamTable::new(NAME)
        .int(ZlibParam::WindowBits, window_bits)
        .apply(FlagPolicy::Checked, |_, value| {
            window = ZlibWindow::parse(value.as_native())?;
            Ok(())
        })?;
    Ok(window)
}

fn delta(after: u64, before: u64) -> usize {
    (after - before) as usize
}

// ---------------------------------------------------------------------------
// Block codecs
// ---------------------------------------------------------------------------

pub struct ZlibBlockBackend {
    settings: ZlibSettings,
    stream: Compress,
}

pub type ZlibCompressor = BlockCompressor<ZlibBlockBackend>;

impl ZlibBlockBackend {
    pub fn new(config: &ZlibCompressorConfig) -> Result<Self> {
        let settings = ZlibSettings::from_config(config)?;
        Ok(Self { settings, stream: settings.window.compress(settings.level) })
    }

    pub fn settings(&self) -> &ZlibSettings {
        &self.settings
    }
}

impl BlockBackend for ZlibBlockBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn compress_bound(&self, input: &[u8]) -> usize {
        self.settings.bound(input.len())
    }

    fn compress_data(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.stream.reset();
        let status = self
            .stream
            .compress(input, output, FlushCompress::Finish)
            .map_err(|e| CompressionError::backend(NAME, e.to_string()))?;
        match status {
            Status::StreamEnd => Ok(self.stream.total_out() as usize),
            Status::Ok | Status::BufError => Err(CompressionError::capacity(
                NAME,
                output.len(),
                Some(self.settings.bound(input.len())),
            )),
        }
    }
}

pub struct ZlibDecompressor {
    window: ZlibWindow,
}

impl ZlibDecompressor {
    pub fn new(config: &ZlibDecompressorConfig) -> Result<Self> {
        Ok(Self { window: decoder_window(config.window_bits)? })
    }
}

impl Decompressor for ZlibDecompressor {
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        // flate2's reset drops custom window bits and gzip mode, so start fresh.
        let mut stream = self.window.decompress();
        let status = stream
            .decompress(input, output, FlushDecompress::Finish)
            .map_err(|e| CompressionError::corrupt(NAME, e.to_string()))?;
        let written = stream.total_out() as usize;
        match status {
            Status::StreamEnd => Ok(written),
            _ if written == output.len() => Err(CompressionError::capacity(NAME, output.len(), None)),
            _ => Err(CompressionError::corrupt(NAME, "truncated stream")),
        }
    }
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

pub struct ZlibEncoder {
    settings: ZlibSettings,
    stream: Option<Compress>,
    // Output of a sync flush the caller has not collected yet.
    spill: Vec<u8>,
    spill_pos: usize,
}

impl ZlibEncoder {
    pub fn new(config: &ZlibEncoderConfig) -> Result<Self> {
        Ok(Self {
            settings: ZlibSettings::from_config(config)?,
            stream: None,
            spill: Vec::new(),
            spill_pos: 0,
        })
    }

    fn stream(&mut self) -> Result<&mut Compress> {
        self.stream
            .as_mut()
            .ok_or_else(|| CompressionError::backend(NAME, "stream used before setup"))
    }

    fn deflate(&mut self, input: &[u8], output: &mut [u8], mode: FlushCompress) -> Result<(usize, usize, Status)> {
        let stream = self.stream()?;
        let (in0, out0) = (stream.total_in(), stream.total_out());
        let status = stream
            .compress(input, output, mode)
            .map_err(|e| CompressionError::backend(NAME, e.to_string()))?;
        Ok((delta(stream.total_in(), in0), delta(stream.total_out(), out0), status))
    }

    /// Sync-flush `input` into the spill buffer in one go.
    ///
    /// zlib repeats the flush marker when a flush ends with no output space left,
    /// so the spill always keeps spare room and the caller's buffer size never matters.
    fn flush_into_spill(&mut self, input: &[u8]) -> Result<usize> {
        let bound = self.settings.bound(input.len()) + 16;
        self.spill.clear();
        self.spill_pos = 0;

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CompressionError::backend(NAME, "stream used before setup"))?;
        let in0 = stream.total_in();
        loop {
            let read = delta(stream.total_in(), in0);
            self.spill.reserve(bound);
            stream
                .compress_vec(&input[read..], &mut self.spill, FlushCompress::Sync)
                .map_err(|e| CompressionError::backend(NAME, e.to_string()))?;
            if delta(stream.total_in(), in0) == input.len() && self.spill.len() < self.spill.capacity() {
                return Ok(input.len());
            }
        }
    }

    fn drain_spill(&mut self, output: &mut [u8]) -> usize {
        let pending = &self.spill[self.spill_pos..];
        let n = pending.len().min(output.len());
        output[..n].copy_from_slice(&pending[..n]);
        self.spill_pos += n;
        n
    }

    fn spill_pending(&self) -> bool {
        self.spill_pos < self.spill.len()
    }
}

impl StreamAdapter for ZlibEncoder {
    fn backend(&self) -> Backend {
        Backend::Zlib
    }

    fn setup(&mut self) -> Result<()> {
        self.stream = Some(self.settings.window.compress(self.settings.level));
        self.spill.clear();
        self.spill_pos = 0;
        Ok(())
    }

    fn process(&mut self, input: &[u8], output: &mut [u8], flush: bool) -> Result<(usize, usize)> {
        if self.spill_pending() {
            return Ok((0, self.drain_spill(output)));
        }
        if !flush {
            let (read, written, _) = self.deflate(input, output, FlushCompress::None)?;
            return Ok((read, written));
        }
        let read = self.flush_into_spill(input)?;
        Ok((read, self.drain_spill(output)))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        let drained = self.drain_spill(output);
        if self.spill_pending() {
            return Ok((drained, true));
        }
        let (_, written, status) = self.deflate(&[], &mut output[drained..], FlushCompress::Finish)?;
        Ok((drained + written, status != Status::StreamEnd))
    }

    fn input_block_size(&self) -> usize {
        ZLIB_INPUT_BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        ZLIB_OUTPUT_BLOCK_SIZE
    }
}

pub struct ZlibDecoder {
    window: ZlibWindow,
    stream: Option<Decompress>,
    finished: bool,
}

impl ZlibDecoder {
    pub fn new(config: &ZlibDecoderConfig) -> Result<Self> {
        Ok(Self { window: decoder_window(config.window_bits)?, stream: None, finished: false })
    }

    fn inflate(&mut self, input: &[u8], output: &mut [u8], mode: FlushDecompress) -> Result<(usize, usize)> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CompressionError::backend(NAME, "stream used before setup"))?;
        let (in0, out0) = (stream.total_in(), stream.total_out());
        let status = stream
            .decompress(input, output, mode)
            .map_err(|e| CompressionError::corrupt(NAME, e.to_string()))?;
        if status == Status::StreamEnd {
            self.finished = true;
        }
        Ok((delta(stream.total_in(), in0), delta(stream.total_out(), out0)))
    }
}

impl StreamAdapter for ZlibDecoder {
    fn backend(&self) -> Backend {
        Backend::Zlib
    }

    fn setup(&mut self) -> Result<()> {
        self.stream = Some(self.window.decompress());
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
        self.inflate(input, output, FlushDecompress::None)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        if self.finished {
            return Ok((0, false));
        }
        let (_, written) = self.inflate(&[], output, FlushDecompress::Finish)?;
        if self.finished {
            Ok((written, false))
        } else if !output.is_empty() && written == output.len() {
            Ok((written, true))
        } else {
            Err(CompressionError::corrupt(NAME, "stream ended before its trailer"))
        }
    }

    fn input_block_size(&self) -> usize {
        ZLIB_INPUT_BLOCK_SIZE
    }

    fn output_block_size(&self) -> usize {
        ZLIB_OUTPUT_BLOCK_SIZE
    }
}
