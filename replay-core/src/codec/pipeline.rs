use super::compressor::ZstdCompressor;
use super::pcm16::Pcm16Codec;
use super::{ByteCompressor, FrameCodec};
use crate::models::config::{AudioProfile, CodecKind, SessionConfig};
use crate::models::error::ReplayError;
use crate::processing::pcm;

/// Per-direction frame compressor/decompressor.
///
/// ```text
/// compress:   [f32 frame] → i16 PCM → FrameCodec → ByteCompressor → packet payload
/// decompress: packet payload → ByteCompressor → FrameCodec → i16 PCM → [f32 samples]
/// ```
///
/// Codec state is per instance; use one pipeline for recording and another
/// for replay.
pub struct CodecPipeline {
    profile: AudioProfile,
    codec: Box<dyn FrameCodec>,
    compressor: Box<dyn ByteCompressor>,
}

impl CodecPipeline {
    pub fn new(profile: AudioProfile, codec: Box<dyn FrameCodec>, compressor: Box<dyn ByteCompressor>) -> Self {
        Self {
            profile,
            codec,
            compressor,
        }
    }

    /// Build the pipeline described by a session configuration.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ReplayError> {
        config.profile.validate().map_err(ReplayError::ConfigurationFailed)?;

        let codec: Box<dyn FrameCodec> = match config.codec.resolve(&config.profile) {
            CodecKind::Pcm16 | CodecKind::Auto => Box::new(Pcm16Codec),
            #[cfg(feature = "opus")]
            CodecKind::Opus => Box::new(super::opus::OpusCodec::new(&config.profile)?),
            #[cfg(not(feature = "opus"))]
            CodecKind::Opus => {
                return Err(ReplayError::ConfigurationFailed(
                    "opus codec requested but the `opus` feature is disabled".into(),
                ))
            }
        };
        let compressor = Box::new(ZstdCompressor::new(config.compression_level)?);

        Ok(Self::new(config.profile, codec, compressor))
    }

    pub fn profile(&self) -> &AudioProfile {
        &self.profile
    }

    /// Interleaved samples every frame passed to `compress` must contain.
    pub fn samples_per_frame(&self) -> usize {
        self.profile.samples_per_frame()
    }

    pub fn describe(&self) -> String {
        format!("{}+{}", self.codec.name(), self.compressor.name())
    }

    /// Compress exactly one frame into a packet payload.
    pub fn compress(&mut self, frame: &[f32]) -> Result<Vec<u8>, ReplayError> {
        if frame.is_empty() {
            return Err(ReplayError::InvalidInput("empty frame".into()));
        }
        let expected = self.samples_per_frame();
        if frame.len() != expected {
            return Err(ReplayError::FrameLengthMismatch {
                expected,
                actual: frame.len(),
            });
        }

        let pcm = pcm::f32_to_i16(frame);
        let encoded = self.codec.encode(&pcm)?;
        self.compressor.compress(&encoded)
    }

    /// Reconstruct up to `target_samples` samples from a packet payload.
    pub fn decompress(&mut self, packet: &[u8], target_samples: usize) -> Result<Vec<f32>, ReplayError> {
        if packet.is_empty() {
            return Err(ReplayError::InvalidInput("empty packet".into()));
        }

        let max_len = self.codec.max_encoded_len(self.samples_per_frame());
        let encoded = self.compressor.decompress(packet, max_len)?;
        let pcm = self.codec.decode(&encoded, target_samples)?;
        Ok(pcm::i16_to_f32(&pcm))
    }
}

impl std::fmt::Debug for CodecPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecPipeline")
            .field("profile", &self.profile)
            .field("stages", &self.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pcm::QUANTIZATION_STEP;
    use approx::assert_abs_diff_eq;

    fn cd_profile() -> AudioProfile {
        AudioProfile {
            sample_rate: 44100,
            channels: 2,
            bitrate: 48000,
            frame_duration_ms: 20,
        }
    }

    fn pipeline(profile: AudioProfile) -> CodecPipeline {
        CodecPipeline::from_config(&SessionConfig {
            profile,
            codec: CodecKind::Pcm16,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn silent_frame_compresses_small() {
        let profile = cd_profile();
        let mut p = pipeline(profile);
        assert_eq!(p.samples_per_frame(), 1764);

        let frame = vec![0.0f32; p.samples_per_frame()];
        let packet = p.compress(&frame).unwrap();
        assert!(!packet.is_empty());
        assert!(packet.len() < 100, "silence compressed to {} bytes", packet.len());

        let decoded = p.decompress(&packet, p.samples_per_frame()).unwrap();
        assert_eq!(decoded.len(), frame.len());
        assert!(decoded.iter().all(|s| s.abs() <= QUANTIZATION_STEP));
    }

    #[test]
    fn round_trip_error_is_quantization_only() {
        let profile = AudioProfile::default();
        let mut p = pipeline(profile);

        // Distinct waveforms per channel so a channel swap would show up.
        let frame: Vec<f32> = (0..p.samples_per_frame())
            .map(|i| {
                let t = (i / 2) as f32;
                if i % 2 == 0 {
                    (t * 0.03).sin() * 0.8
                } else {
                    (t * 0.11).cos() * -0.4
                }
            })
            .collect();

        let packet = p.compress(&frame).unwrap();
        let decoded = p.decompress(&packet, frame.len()).unwrap();

        assert_eq!(decoded.len(), frame.len());
        for (a, b) in frame.iter().zip(&decoded) {
            assert_abs_diff_eq!(*a, *b, epsilon = QUANTIZATION_STEP + f32::EPSILON);
        }
    }

    #[test]
    fn out_of_range_samples_clamp() {
        let profile = AudioProfile::default();
        let mut p = pipeline(profile);
        let frame = vec![2.0f32; p.samples_per_frame()];

        let packet = p.compress(&frame).unwrap();
        let decoded = p.decompress(&packet, frame.len()).unwrap();
        assert!(decoded.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn empty_frame_is_invalid_input() {
        let mut p = pipeline(AudioProfile::default());
        assert!(matches!(p.compress(&[]), Err(ReplayError::InvalidInput(_))));
        assert!(matches!(p.decompress(&[], 10), Err(ReplayError::InvalidInput(_))));
    }

    #[test]
    fn wrong_frame_length_is_rejected() {
        let mut p = pipeline(AudioProfile::default());

        let short = vec![0.1f32; 100];
        assert_eq!(
            p.compress(&short).unwrap_err(),
            ReplayError::FrameLengthMismatch {
                expected: 1920,
                actual: 100
            }
        );

        let long = vec![0.1f32; 1921];
        assert!(matches!(
            p.compress(&long),
            Err(ReplayError::FrameLengthMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_packet_is_decode_error_and_pipeline_recovers() {
        let mut p = pipeline(AudioProfile::default());
        let frame = vec![0.25f32; p.samples_per_frame()];
        let packet = p.compress(&frame).unwrap();

        let mut corrupt = packet.clone();
        corrupt.truncate(corrupt.len() / 2);
        assert!(matches!(
            p.decompress(&corrupt, frame.len()),
            Err(ReplayError::DecodeError(_))
        ));

        // The next good packet still decodes.
        let decoded = p.decompress(&packet, frame.len()).unwrap();
        assert_eq!(decoded.len(), frame.len());
    }

    #[test]
    fn target_sample_count_limits_output() {
        let mut p = pipeline(AudioProfile::default());
        let frame = vec![0.5f32; p.samples_per_frame()];
        let packet = p.compress(&frame).unwrap();
        assert_eq!(p.decompress(&packet, 10).unwrap().len(), 10);
    }

    #[test]
    fn default_config_picks_codec_by_profile() {
        let p = CodecPipeline::from_config(&SessionConfig::default()).unwrap();
        let expected = if cfg!(feature = "opus") { "opus+zstd" } else { "pcm16+zstd" };
        assert_eq!(p.describe(), expected);

        let cd = CodecPipeline::from_config(&SessionConfig {
            profile: cd_profile(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cd.describe(), "pcm16+zstd");
    }

    #[cfg(not(feature = "opus"))]
    #[test]
    fn opus_without_feature_is_configuration_error() {
        let config = SessionConfig {
            codec: CodecKind::Opus,
            ..Default::default()
        };
        assert!(matches!(
            CodecPipeline::from_config(&config),
            Err(ReplayError::ConfigurationFailed(_))
        ));
    }
}
