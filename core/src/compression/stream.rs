//! compression/stream.rs
//! Stream lifecycle controller and pump helpers.
//!
//! Design notes:
//! - One explicit `StreamState` field with guarded transitions; no boolean flags.
//! - Backends implement `StreamAdapter` and never see an out-of-order call.
//! - The flush flag is captured once by `initialize` and passed to every `process`.
//! - Pump helpers keep all I/O on the caller side: they read, hand over resident
//!   buffers, and write what the stream produced.
use std::io::{ErrorKind as IoErrorKind, Read, Write};

use crate::compression::types::{Backend, BlockSizes, CompressionError, Result, Stream, StreamState};
use crate::telemetry::{StreamCounters, StreamSnapshot};

/// Fallback chunk size for adapters without a preference.
pub const DEFAULT_STREAM_BLOCK_SIZE: usize = 64 * 1024;

/// Hooks a backend supplies to the lifecycle controller.
pub trait StreamAdapter: Send {
    fn backend(&self) -> Backend;

    /// Allocate or rebind the native state; called once by `initialize`.
    fn setup(&mut self) -> Result<()>;

    /// Consume from `input` and write to `output`. Returns `(read, written)`.
    fn process(&mut self, input: &[u8], output: &mut [u8], flush: bool) -> Result<(usize, usize)>;

    /// Write remaining output. Returns `(written, more_pending)`.
    fn finish(&mut self, output: &mut [u8]) -> Result<(usize, bool)>;

    fn input_block_size(&self) -> usize {
        0
    }

    fn output_block_size(&self) -> usize {
        0
    }
}

/// Generic four-state controller over a `StreamAdapter`.
pub struct StreamController<A> {
    adapter: A,
    state: StreamState,
    flush: bool,
    counters: StreamCounters,
}

impl<A: StreamAdapter> StreamController<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            state: StreamState::Created,
            flush: false,
            counters: StreamCounters::default(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn flush(&self) -> bool {
        self.flush
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot::from(self.adapter.backend(), self.state, &self.counters)
    }

    fn transition(&mut self, next: StreamState) {
        tracing::debug!(backend = %self.adapter.backend(), from = %self.state, to = %next, "stream state");
        self.state = next;
    }

    fn usage(&self, op: &'static str) -> CompressionError {
        CompressionError::InvalidUsage { op, state: self.state }
    }
}

impl<A: StreamAdapter> Stream for StreamController<A> {
    fn initialize(&mut self, flush: bool) -> Result<()> {
        if self.state != StreamState::Created {
            return Err(self.usage("initialize"));
        }
        self.adapter.setup()?;
        self.flush = flush;
        self.transition(StreamState::Processing);
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize)> {
        if self.state != StreamState::Processing {
            return Err(self.usage("update"));
        }
        let (read, written) = self.adapter.process(input, output, self.flush)?;
        self.counters.add_update(read, written);
        tracing::trace!(backend = %self.adapter.backend(), read, written, "update");
        Ok((read, written))
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<(usize, bool)> {
        match self.state {
            // Nothing was ever submitted.
            StreamState::Created => {
                self.transition(StreamState::Finalized);
                return Ok((0, false));
            }
            StreamState::Processing => self.transition(StreamState::Finalizing),
            StreamState::Finalizing => {}
            StreamState::Finalized => return Ok((0, false)),
        }

        let (written, more) = self.adapter.finish(output)?;
        self.counters.add_finalize(written);
        tracing::trace!(backend = %self.adapter.backend(), written, more, "finalize");
        if !more {
            self.transition(StreamState::Finalized);
        }
        Ok((written, more))
    }

    fn block_sizes(&self) -> BlockSizes {
        BlockSizes {
            input: self.adapter.input_block_size(),
            output: self.adapter.output_block_size(),
        }
    }

    fn state(&self) -> StreamState {
        self.state
    }

    fn counters(&self) -> &StreamCounters {
        &self.counters
    }
}

#[inline]
/// Summary: Run `reader` through `stream` into `writer` using its advisory block sizes.
/// - Initializes the stream, pumps every chunk, then finalizes until nothing is pending.
/// - Returns the number of bytes written.
pub fn drive_stream<R: Read, W: Write>(
    stream: &mut dyn Stream,
    flush: bool,
    reader: R,
    writer: W,
) -> Result<u64> {
    let sizes = stream.block_sizes();
    drive_stream_with(stream, flush, reader, writer, sizes)
}

/// Summary: Same as [`drive_stream`] with caller-chosen buffer sizes.
/// - A zero size falls back to `DEFAULT_STREAM_BLOCK_SIZE`.
/// - A call that neither reads nor writes is reported instead of spinning.
pub fn drive_stream_with<R: Read, W: Write>(
    stream: &mut dyn Stream,
    flush: bool,
    mut reader: R,
    mut writer: W,
    sizes: BlockSizes,
) -> Result<u64> {
    let in_size = if sizes.input == 0 { DEFAULT_STREAM_BLOCK_SIZE } else { sizes.input };
    let out_size = if sizes.output == 0 { DEFAULT_STREAM_BLOCK_SIZE } else { sizes.output };
    let mut inbuf = vec![0u8; in_size];
    let mut outbuf = vec![0u8; out_size];
    let mut total: u64 = 0;

    stream.initialize(flush)?;

    loop {
        let n = match reader.read(&mut inbuf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        let mut chunk = &inbuf[..n];
        while !chunk.is_empty() {
            let (read, written) = stream.update(chunk, &mut outbuf)?;
            if read == 0 && written == 0 {
                return Err(CompressionError::backend("stream", "no progress on update"));
            }
            writer.write_all(&outbuf[..written])?;
            total += written as u64;
            chunk = &chunk[read..];
        }
    }

    loop {
        let (written, more) = stream.finalize(&mut outbuf)?;
        writer.write_all(&outbuf[..written])?;
        total += written as u64;
        if !more {
            break;
        }
    }

    writer.flush()?;
    Ok(total)
}
