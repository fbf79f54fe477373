use serde::{Deserialize, Serialize};

use super::error::ReplayError;

/// Fixed audio profile shared by capture, codec and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProfile {
    /// Sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Interleaved channel count (default: 2). Valid values: 1, 2.
    pub channels: u16,

    /// Target codec bitrate in bits per second (default: 48000).
    pub bitrate: u32,

    /// Duration of one frame in milliseconds (default: 20).
    pub frame_duration_ms: u32,
}

impl AudioProfile {
    /// Samples per channel in one frame.
    pub fn frames_per_chunk(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000) as usize
    }

    /// Interleaved samples in one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.frames_per_chunk() * self.channels as usize
    }

    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frame_duration_ms as u64)
    }

    /// Seconds of audio represented by `samples` interleaved samples.
    pub fn duration_of(&self, samples: u64) -> f64 {
        samples as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Whether Opus can encode this profile as-is.
    pub fn is_opus_compatible(&self) -> bool {
        [8000, 12000, 16000, 24000, 48000].contains(&self.sample_rate)
            && [10, 20, 40, 60].contains(&self.frame_duration_ms)
            && [1, 2].contains(&self.channels)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.frame_duration_ms == 0 {
            return Err("frame duration must be positive".into());
        }
        if (self.sample_rate as u64 * self.frame_duration_ms as u64) % 1000 != 0 {
            return Err(format!(
                "{} Hz does not divide into whole {} ms frames",
                self.sample_rate, self.frame_duration_ms
            ));
        }
        if self.bitrate == 0 {
            return Err("bitrate must be positive".into());
        }
        Ok(())
    }
}

impl Default for AudioProfile {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            bitrate: 48000,
            frame_duration_ms: 20,
        }
    }
}

/// Lossy stage used by the codec pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Opus when the build and the profile allow it, `Pcm16` otherwise.
    Auto,
    /// 16-bit little-endian PCM; only the quantization is lossy.
    Pcm16,
    /// Opus, requires the `opus` feature.
    Opus,
}

impl CodecKind {
    /// The concrete codec used for `profile`. Never returns `Auto`.
    pub fn resolve(self, profile: &AudioProfile) -> CodecKind {
        match self {
            CodecKind::Auto if cfg!(feature = "opus") && profile.is_opus_compatible() => CodecKind::Opus,
            CodecKind::Auto => CodecKind::Pcm16,
            other => other,
        }
    }
}

/// Configuration for a record/replay session controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub profile: AudioProfile,

    /// Capacity of each real-time ring buffer, in samples (default: 8192).
    pub ring_capacity: usize,

    pub codec: CodecKind,

    /// zstd compression level for the lossless stage (default: 3).
    pub compression_level: i32,

    /// Restart segment replay from the top when it reaches the end (default: true).
    pub loop_segment_replay: bool,

    /// Endpoint probe attempts before giving up (default: 10).
    pub probe_attempts: u32,

    /// Delay between endpoint probe attempts in milliseconds (default: 100).
    pub probe_interval_ms: u64,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.profile.validate()?;
        if self.ring_capacity == 0 {
            return Err("ring capacity must be positive".into());
        }
        if self.ring_capacity < self.profile.samples_per_frame() {
            return Err(format!(
                "ring capacity {} is smaller than one frame ({} samples)",
                self.ring_capacity,
                self.profile.samples_per_frame()
            ));
        }
        if !(1..=22).contains(&self.compression_level) {
            return Err(format!("unsupported compression level: {}", self.compression_level));
        }
        if self.probe_attempts == 0 {
            return Err("probe attempts must be positive".into());
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ReplayError::ConfigurationFailed(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(ReplayError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReplayError::ConfigurationFailed(format!("failed to serialize config: {}", e)))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: AudioProfile::default(),
            ring_capacity: 8192,
            codec: CodecKind::Auto,
            compression_level: 3,
            loop_segment_replay: true,
            probe_attempts: 10,
            probe_interval_ms: 100,
        }
    }
}
