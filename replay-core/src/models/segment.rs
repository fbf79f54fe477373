use serde::{Deserialize, Serialize};

/// Number of segment slots in the table.
pub const SEGMENT_SLOTS: usize = 3;

/// Serialized size of one `(start, end)` entry.
pub const SEGMENT_ENTRY_SIZE: usize = 16;

/// Size of the segment table header at offset 0 of the backing store.
pub const HEADER_SIZE: usize = SEGMENT_SLOTS * SEGMENT_ENTRY_SIZE;

/// A recorded take: the byte range `[start, end)` of the backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub start: i64,
    pub end: i64,
}

impl AudioSegment {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Populated means it holds audio that can be replayed.
    pub fn is_populated(&self) -> bool {
        self.start >= HEADER_SIZE as i64 && self.end > self.start
    }

    /// Whether a start offset has been assigned to this slot.
    pub fn has_start(&self) -> bool {
        self.start >= HEADER_SIZE as i64
    }

    pub fn len(&self) -> u64 {
        if self.end > self.start {
            (self.end - self.start) as u64
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-capacity table of segments, persisted as a 48-byte header.
///
/// Layout, all values `i64` little-endian:
/// ```text
/// [0-7]    segment0.start
/// [8-15]   segment0.end
/// [16-23]  segment1.start
/// [24-31]  segment1.end
/// [32-39]  segment2.start
/// [40-47]  segment2.end
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTable {
    segments: [AudioSegment; SEGMENT_SLOTS],
}

impl SegmentTable {
    pub fn new(segments: [AudioSegment; SEGMENT_SLOTS]) -> Self {
        Self { segments }
    }

    pub fn get(&self, index: usize) -> Option<&AudioSegment> {
        self.segments.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut AudioSegment> {
        self.segments.get_mut(index)
    }

    pub fn segments(&self) -> &[AudioSegment; SEGMENT_SLOTS] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [AudioSegment; SEGMENT_SLOTS] {
        &mut self.segments
    }

    pub fn populated_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_populated()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated_count() == 0
    }

    pub fn clear(&mut self) {
        self.segments = [AudioSegment::EMPTY; SEGMENT_SLOTS];
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        for (i, segment) in self.segments.iter().enumerate() {
            let offset = i * SEGMENT_ENTRY_SIZE;
            header[offset..offset + 8].copy_from_slice(&segment.start.to_le_bytes());
            header[offset + 8..offset + 16].copy_from_slice(&segment.end.to_le_bytes());
        }
        header
    }

    /// Decode a header. Entries that are not populated load as empty.
    ///
    /// Input shorter than `HEADER_SIZE` is treated as zero-filled.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut header = [0u8; HEADER_SIZE];
        let n = data.len().min(HEADER_SIZE);
        header[..n].copy_from_slice(&data[..n]);

        let mut table = Self::default();
        for (i, slot) in table.segments.iter_mut().enumerate() {
            let offset = i * SEGMENT_ENTRY_SIZE;
            let mut start = [0u8; 8];
            let mut end = [0u8; 8];
            start.copy_from_slice(&header[offset..offset + 8]);
            end.copy_from_slice(&header[offset + 8..offset + 16]);

            let segment = AudioSegment::new(i64::from_le_bytes(start), i64::from_le_bytes(end));
            if segment.is_populated() {
                *slot = segment;
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_48_bytes_regardless_of_population() {
        assert_eq!(SegmentTable::default().to_bytes().len(), 48);
        let table = SegmentTable::new([AudioSegment::new(48, 100); SEGMENT_SLOTS]);
        assert_eq!(table.to_bytes().len(), 48);
    }

    #[test]
    fn header_layout_is_little_endian_pairs() {
        let table = SegmentTable::new([
            AudioSegment::new(48, 1048),
            AudioSegment::new(1048, 2048),
            AudioSegment::EMPTY,
        ]);
        let header = table.to_bytes();

        assert_eq!(i64::from_le_bytes(header[0..8].try_into().unwrap()), 48);
        assert_eq!(i64::from_le_bytes(header[8..16].try_into().unwrap()), 1048);
        assert_eq!(i64::from_le_bytes(header[16..24].try_into().unwrap()), 1048);
        assert_eq!(i64::from_le_bytes(header[24..32].try_into().unwrap()), 2048);
        assert!(header[32..48].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trip_preserves_valid_segments() {
        let table = SegmentTable::new([
            AudioSegment::new(48, 5000),
            AudioSegment::new(5000, 5001),
            AudioSegment::new(9000, 123_456_789),
        ]);
        assert_eq!(SegmentTable::from_bytes(&table.to_bytes()), table);
    }

    #[test]
    fn all_zero_header_is_empty_table() {
        let table = SegmentTable::from_bytes(&[0u8; HEADER_SIZE]);
        assert!(table.is_empty());
        assert_eq!(table, SegmentTable::default());
    }

    #[test]
    fn short_header_is_zero_filled() {
        let mut data = Vec::new();
        data.extend_from_slice(&48i64.to_le_bytes());
        data.extend_from_slice(&96i64.to_le_bytes());
        let table = SegmentTable::from_bytes(&data);
        assert_eq!(table.get(0), Some(&AudioSegment::new(48, 96)));
        assert_eq!(table.populated_count(), 1);
    }

    #[test]
    fn invalid_entries_load_as_empty() {
        let table = SegmentTable::new([
            AudioSegment::new(10, 100),  // start inside header
            AudioSegment::new(200, 200), // zero length
            AudioSegment::new(300, 100), // inverted
        ]);
        assert!(SegmentTable::from_bytes(&table.to_bytes()).is_empty());
    }

    #[test]
    fn segment_len() {
        assert_eq!(AudioSegment::new(48, 1048).len(), 1000);
        assert_eq!(AudioSegment::new(1048, 0).len(), 0);
        assert!(AudioSegment::EMPTY.is_empty());
        assert!(!AudioSegment::EMPTY.has_start());
    }
}
