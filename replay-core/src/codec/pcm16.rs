use super::FrameCodec;
use crate::models::error::ReplayError;

/// Raw 16-bit little-endian PCM.
///
/// Works at any sample rate. The only loss in the pipeline comes from the
/// float → i16 quantization done before this stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pcm16Codec;

impl FrameCodec for Pcm16Codec {
    fn name(&self) -> &'static str {
        "pcm16"
    }

    fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>, ReplayError> {
        let mut data = Vec::with_capacity(pcm.len() * 2);
        for &sample in pcm {
            data.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(data)
    }

    fn decode(&mut self, data: &[u8], max_samples: usize) -> Result<Vec<i16>, ReplayError> {
        if data.len() % 2 != 0 {
            return Err(ReplayError::DecodeError(format!(
                "pcm16 payload has odd length {}",
                data.len()
            )));
        }
        Ok(data
            .chunks_exact(2)
            .take(max_samples)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    fn max_encoded_len(&self, samples: usize) -> usize {
        samples * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_little_endian() {
        let mut codec = Pcm16Codec;
        let data = codec.encode(&[1, -2, 0x1234]).unwrap();
        assert_eq!(data, vec![0x01, 0x00, 0xFE, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn decode_respects_max_samples() {
        let mut codec = Pcm16Codec;
        let data = codec.encode(&[1, 2, 3, 4]).unwrap();
        assert_eq!(codec.decode(&data, 2).unwrap(), vec![1, 2]);
        assert_eq!(codec.decode(&data, 10).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn odd_payload_is_decode_error() {
        let mut codec = Pcm16Codec;
        let err = codec.decode(&[1, 2, 3], 8).unwrap_err();
        assert!(matches!(err, ReplayError::DecodeError(_)));
    }
}
