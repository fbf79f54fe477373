use zstd::bulk::{Compressor, Decompressor};

use super::ByteCompressor;
use crate::models::error::ReplayError;

/// zstd lossless stage. Compression and decompression contexts are reused across frames.
pub struct ZstdCompressor {
    compressor: Compressor<'static>,
    decompressor: Decompressor<'static>,
    level: i32,
}

impl ZstdCompressor {
    pub const DEFAULT_LEVEL: i32 = 3;

    pub fn new(level: i32) -> Result<Self, ReplayError> {
        let compressor = Compressor::new(level)
            .map_err(|e| ReplayError::ConfigurationFailed(format!("zstd compressor init: {}", e)))?;
        let decompressor = Decompressor::new()
            .map_err(|e| ReplayError::ConfigurationFailed(format!("zstd decompressor init: {}", e)))?;
        Ok(Self {
            compressor,
            decompressor,
            level,
        })
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl std::fmt::Debug for ZstdCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdCompressor").field("level", &self.level).finish()
    }
}

impl ByteCompressor for ZstdCompressor {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, ReplayError> {
        self.compressor
            .compress(data)
            .map_err(|e| ReplayError::EncodeError(format!("zstd compress: {}", e)))
    }

    fn decompress(&mut self, data: &[u8], max_len: usize) -> Result<Vec<u8>, ReplayError> {
        self.decompressor
            .decompress(data, max_len)
            .map_err(|e| ReplayError::DecodeError(format!("zstd decompress: {}", e)))
    }
}
