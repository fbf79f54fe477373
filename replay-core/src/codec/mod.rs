//! Two-stage frame codec: a lossy audio codec over 16-bit PCM followed by a
//! lossless byte compressor. Either stage can be swapped independently.

pub mod compressor;
pub mod pcm16;
pub mod pipeline;

#[cfg(feature = "opus")]
pub mod opus;

use crate::models::error::ReplayError;

/// Lossy audio stage: one frame of interleaved 16-bit PCM in, codec bytes out.
pub trait FrameCodec: Send {
    fn name(&self) -> &'static str;

    fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>, ReplayError>;

    /// Decode into at most `max_samples` interleaved samples.
    fn decode(&mut self, data: &[u8], max_samples: usize) -> Result<Vec<i16>, ReplayError>;

    /// Upper bound on `encode` output for a frame of `samples` samples.
    fn max_encoded_len(&self, samples: usize) -> usize;
}

/// Lossless byte stage. Must reproduce its input exactly.
pub trait ByteCompressor: Send {
    fn name(&self) -> &'static str;

    fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, ReplayError>;

    /// Fails with `DecodeError` if the output would exceed `max_len`.
    fn decompress(&mut self, data: &[u8], max_len: usize) -> Result<Vec<u8>, ReplayError>;
}
