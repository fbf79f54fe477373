//! Float ↔ 16-bit PCM conversion.
//!
//! Scaling is symmetric around `i16::MAX`: a full-scale float maps to
//! ±32767 and -32768 decodes to slightly below -1.0.

const SCALE: f32 = i16::MAX as f32;

/// Convert one float sample to 16-bit PCM, clamping to `[-1.0, 1.0]` and rounding.
#[inline]
pub fn to_i16(sample: f32) -> i16 {
    let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    (clamped * SCALE).round() as i16
}

#[inline]
pub fn to_f32(sample: i16) -> f32 {
    sample as f32 / SCALE
}

pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| to_i16(s)).collect()
}

pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| to_f32(s)).collect()
}

/// Largest absolute error introduced by one float → i16 → float round trip.
pub const QUANTIZATION_STEP: f32 = 0.5 / SCALE;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_scale_and_clamping() {
        assert_eq!(to_i16(1.0), 32767);
        assert_eq!(to_i16(-1.0), -32767);
        assert_eq!(to_i16(3.5), 32767);
        assert_eq!(to_i16(-3.5), -32767);
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(f32::NAN), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        // 0.5 / 32767 sits exactly between 0 and 1 LSB; slightly above rounds up.
        assert_eq!(to_i16(0.6 / SCALE), 1);
        assert_eq!(to_i16(0.4 / SCALE), 0);
        assert_eq!(to_i16(-0.6 / SCALE), -1);
    }

    #[test]
    fn round_trip_error_is_bounded() {
        let input: Vec<f32> = (0..2000).map(|i| ((i as f32) * 0.013).sin() * 0.9).collect();
        let output = i16_to_f32(&f32_to_i16(&input));

        assert_eq!(output.len(), input.len());
        for (a, b) in input.iter().zip(&output) {
            assert_abs_diff_eq!(*a, *b, epsilon = QUANTIZATION_STEP + f32::EPSILON);
        }
    }
}
