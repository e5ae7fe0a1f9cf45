//! compression/block.rs
//! Shared two-phase block compressor.
//!
//! Design notes:
//! - Backends only supply a bound and a data call; the sizing/data split lives here once.
//! - The sizing call never touches an output buffer and never fails on capacity.
//! - Backends reset their native context inside `compress_data`, so calls stay independent.

use crate::compression::types::{CompressOutcome, CompressionError, Compressor, Decompressor, Result};

/// Primitive operations a backend provides for one-shot compression.
pub trait BlockBackend: Send {
    fn name(&self) -> &'static str;

    /// Worst-case compressed size for `input`.
    fn compress_bound(&self, input: &[u8]) -> usize;

    /// Compress `input` into `output`, returning the exact size written.
    ///
    /// # Errors
    /// - `InsufficientCapacity` when `output` cannot hold the result.
    fn compress_data(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;
}

/// Wraps a `BlockBackend` with the measure-then-write protocol.
pub struct BlockCompressor<B> {
    backend: B,
}

impl<B: BlockBackend> BlockCompressor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: BlockBackend> Compressor for BlockCompressor<B> {
    fn compress(&mut self, input: &[u8], output: Option<&mut [u8]>) -> Result<CompressOutcome> {
        match output {
            None => {
                let bound = self.backend.compress_bound(input);
                tracing::trace!(backend = self.backend.name(), input = input.len(), bound, "sizing call");
                Ok(CompressOutcome { written: 0, capacity: bound })
            }
            Some(out) => {
                let capacity = out.len();
                let written = self.backend.compress_data(input, out)?;
                tracing::trace!(backend = self.backend.name(), input = input.len(), written, "compressed");
                Ok(CompressOutcome { written, capacity })
            }
        }
    }
}

/// Compress `input` with one sizing call and one exactly-sized allocation.
pub fn compress_to_vec(compressor: &mut dyn Compressor, input: &[u8]) -> Result<Vec<u8>> {
    let sizing = compressor.compress(input, None)?;
    let mut out = vec![0u8; sizing.capacity];
    let outcome = compressor.compress(input, Some(&mut out))?;
    out.truncate(outcome.written);
    Ok(out)
}

/// Decompress into a fresh buffer of `expected_len` bytes.
///
/// # Errors
/// - `CorruptInput` if the payload decodes to fewer bytes than `expected_len`.
pub fn decompress_to_vec(
    decompressor: &mut dyn Decompressor,
    input: &[u8],
    expected_len: usize,
) -> Result<Vec<u8>> {
    let mut out = vec![0u8; expected_len];
    let written = decompressor.decompress(input, &mut out)?;
    if written != expected_len {
        return Err(CompressionError::corrupt(
            "block",
            format!("decoded size {written} != expected {expected_len}"),
        ));
    }
    Ok(out)
}
