use thiserror::Error;

/// Errors that can occur while recording, encoding, storing or replaying audio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// No capture or render endpoint after the probe budget. Holds one entry per failed attempt.
    #[error("device unavailable after {} failed probes:\n{}", .0.len(), .0.join("\n"))]
    DeviceUnavailable(Vec<String>),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLengthMismatch { expected: usize, actual: usize },

    #[error("encode failed: {0}")]
    EncodeError(String),

    #[error("decode failed: {0}")]
    DecodeError(String),

    #[error("store I/O error: {0}")]
    StoreIo(String),

    #[error("truncated stream: expected {expected} bytes, got {actual}")]
    TruncatedStream { expected: usize, actual: usize },

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl ReplayError {
    /// Whether this error only affects a single chunk and the stream can keep going.
    pub fn is_chunk_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::FrameLengthMismatch { .. }
                | Self::EncodeError(_)
                | Self::DecodeError(_)
        )
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        Self::StoreIo(e.to_string())
    }
}
