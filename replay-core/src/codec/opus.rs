use audiopus::coder::{Decoder, Encoder};
use audiopus::{Application, Bitrate, Channels, SampleRate};

use super::FrameCodec;
use crate::models::config::AudioProfile;
use crate::models::error::ReplayError;

/// Opus lossy stage (`opus` feature).
///
/// Only Opus-legal profiles are accepted: 8/12/16/24/48 kHz and
/// 10/20/40/60 ms frames. The profile bitrate is applied to the encoder.
pub struct OpusCodec {
    encoder: Encoder,
    decoder: Decoder,
    channels: usize,
}

impl OpusCodec {
    /// Recommended upper bound for one encoded Opus packet.
    pub const MAX_PACKET_SIZE: usize = 4000;

    pub fn new(profile: &AudioProfile) -> Result<Self, ReplayError> {
        let sample_rate = match profile.sample_rate {
            8000 => SampleRate::Hz8000,
            12000 => SampleRate::Hz12000,
            16000 => SampleRate::Hz16000,
            24000 => SampleRate::Hz24000,
            48000 => SampleRate::Hz48000,
            other => {
                return Err(ReplayError::ConfigurationFailed(format!(
                    "opus does not support {} Hz",
                    other
                )))
            }
        };
        if ![10, 20, 40, 60].contains(&profile.frame_duration_ms) {
            return Err(ReplayError::ConfigurationFailed(format!(
                "opus does not support {} ms frames",
                profile.frame_duration_ms
            )));
        }
        let channels = match profile.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            other => {
                return Err(ReplayError::ConfigurationFailed(format!(
                    "opus does not support {} channels",
                    other
                )))
            }
        };

        let mut encoder = Encoder::new(sample_rate, channels, Application::Audio)
            .map_err(|e| ReplayError::ConfigurationFailed(format!("opus encoder init: {}", e)))?;
        encoder
            .set_bitrate(Bitrate::BitsPerSecond(profile.bitrate as i32))
            .map_err(|e| ReplayError::ConfigurationFailed(format!("opus bitrate: {}", e)))?;
        let decoder = Decoder::new(sample_rate, channels)
            .map_err(|e| ReplayError::ConfigurationFailed(format!("opus decoder init: {}", e)))?;

        Ok(Self {
            encoder,
            decoder,
            channels: profile.channels as usize,
        })
    }
}

impl FrameCodec for OpusCodec {
    fn name(&self) -> &'static str {
        "opus"
    }

    fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>, ReplayError> {
        let mut data = vec![0u8; Self::MAX_PACKET_SIZE];
        let n = self
            .encoder
            .encode(pcm, &mut data)
            .map_err(|e| ReplayError::EncodeError(format!("opus encode: {}", e)))?;
        data.truncate(n);
        Ok(data)
    }

    fn decode(&mut self, data: &[u8], max_samples: usize) -> Result<Vec<i16>, ReplayError> {
        let mut pcm = vec![0i16; max_samples];
        let frames = self
            .decoder
            .decode(Some(data), &mut pcm, false)
            .map_err(|e| ReplayError::DecodeError(format!("opus decode: {}", e)))?;
        pcm.truncate((frames * self.channels).min(max_samples));
        Ok(pcm)
    }

    fn max_encoded_len(&self, _samples: usize) -> usize {
        Self::MAX_PACKET_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::compressor::ZstdCompressor;
    use crate::codec::pipeline::CodecPipeline;

    #[test]
    fn rejects_cd_sample_rate() {
        let profile = AudioProfile {
            sample_rate: 44100,
            ..Default::default()
        };
        assert!(matches!(
            OpusCodec::new(&profile),
            Err(ReplayError::ConfigurationFailed(_))
        ));
    }

    fn channel(samples: &[f32], index: usize) -> Vec<f32> {
        samples.iter().skip(index).step_by(2).copied().collect()
    }

    /// Error of `decoded` against `reference` shifted by `lag`, as (rms, max).
    fn error_at(reference: &[f32], decoded: &[f32], lag: usize, range: std::ops::Range<usize>) -> (f32, f32) {
        let mut sum = 0.0f32;
        let mut max = 0.0f32;
        for k in range.clone() {
            let diff = (decoded[k + lag] - reference[k]).abs();
            sum += diff * diff;
            max = max.max(diff);
        }
        ((sum / range.len() as f32).sqrt(), max)
    }

    #[test]
    fn stereo_round_trip_is_close_and_keeps_channels_apart() {
        let profile = AudioProfile::default();
        let mut pipeline = CodecPipeline::new(
            profile,
            Box::new(OpusCodec::new(&profile).unwrap()),
            Box::new(ZstdCompressor::new(3).unwrap()),
        );
        let spf = profile.samples_per_frame();
        let rate = profile.sample_rate as f32;

        // 440 Hz on the left, 1 kHz on the right.
        let input: Vec<f32> = (0..spf * 25)
            .map(|i| {
                let t = (i / 2) as f32 / rate;
                if i % 2 == 0 {
                    (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
                } else {
                    (2.0 * std::f32::consts::PI * 1000.0 * t).sin() * 0.3
                }
            })
            .collect();

        let mut decoded = Vec::with_capacity(input.len());
        for frame in input.chunks(spf) {
            let packet = pipeline.compress(frame).unwrap();
            let out = pipeline.decompress(&packet, spf).unwrap();
            assert_eq!(out.len(), spf);
            decoded.extend(out);
        }

        let (ref_left, ref_right) = (channel(&input, 0), channel(&input, 1));
        let (out_left, out_right) = (channel(&decoded, 0), channel(&decoded, 1));

        // Skip the warm-up frames, then line the output up with the input:
        // the decoder lags by the encoder's look-ahead.
        let frame = profile.frames_per_chunk();
        let window = frame * 5..frame * 20;
        let lag = (0..=frame)
            .min_by(|a, b| {
                let ea = error_at(&ref_left, &out_left, *a, window.clone()).0;
                let eb = error_at(&ref_left, &out_left, *b, window.clone()).0;
                ea.total_cmp(&eb)
            })
            .unwrap();

        let (left_rms, left_max) = error_at(&ref_left, &out_left, lag, window.clone());
        let (right_rms, right_max) = error_at(&ref_right, &out_right, lag, window.clone());
        assert!(left_rms < 0.1, "left rms error {left_rms}");
        assert!(right_rms < 0.1, "right rms error {right_rms}");
        assert!(left_max < 0.3, "left max error {left_max}");
        assert!(right_max < 0.3, "right max error {right_max}");

        // Swapped channels would be far off.
        let (swapped_rms, _) = error_at(&ref_right, &out_left, lag, window);
        assert!(swapped_rms > 0.2, "swapped rms error {swapped_rms}");
    }
}
