use serde::{Deserialize, Serialize};

use super::segment::AudioSegment;

/// Counters produced by the encode loop of one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingStats {
    pub packets_written: u64,
    /// Bytes written to the sink, size prefixes included.
    pub bytes_written: u64,
    /// Interleaved samples that made it into a packet (padding included).
    pub samples_encoded: u64,
    pub frames_dropped: u64,
    /// SHA-256 hex digest of every byte written to the sink.
    pub checksum: String,
}

/// Result returned when a recording session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub id: String,
    /// Segment slot the take was recorded into, `None` for a plain byte sink.
    pub slot: Option<usize>,
    /// Final range of the take when recorded into a slot.
    pub segment: Option<AudioSegment>,
    pub duration_secs: f64,
    pub stats: RecordingStats,
    pub created_at: String,
}

impl RecordingResult {
    pub fn new(slot: Option<usize>, segment: Option<AudioSegment>, duration_secs: f64, stats: RecordingStats) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            slot,
            segment,
            duration_secs,
            stats,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Counters produced by the decode loop of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub packets_decoded: u64,
    pub packets_dropped: u64,
    pub samples_queued: u64,
    /// Times a looping segment replay restarted from the top.
    pub loops: u64,
    /// Streams that ended on a truncated or unframeable packet.
    pub truncated_streams: u64,
}
