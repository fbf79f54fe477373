use std::sync::Arc;

use super::backing::BackingStore;
use super::section::{SectionReader, SectionWriter};
use crate::models::error::ReplayError;
use crate::models::segment::{AudioSegment, SegmentTable, HEADER_SIZE, SEGMENT_SLOTS};
use crate::models::state::SlotState;

/// Segment table plus range-scoped access to one shared backing store.
///
/// ## Store layout
///
/// ```text
/// [48-byte segment table]
/// [segment 0 packets...][segment 1 packets...][segment 2 packets...]
/// ```
///
/// Segments normally chain: each new slot starts where the previous one
/// ended. Re-recording a slot whose start is already set overwrites it
/// from that start.
pub struct SegmentStore {
    store: Arc<dyn BackingStore>,
    table: SegmentTable,
    active: usize,
    state: SlotState,
}

impl SegmentStore {
    /// Load the segment table from the header of `store`.
    ///
    /// A missing, short, unreadable or all-zero header yields an empty table.
    pub fn open(store: Arc<dyn BackingStore>) -> Self {
        let mut header = [0u8; HEADER_SIZE];
        let table = match store.read_at(0, &mut header) {
            Ok(0) => {
                log::info!("Backing store has no segment header, starting with an empty table");
                SegmentTable::default()
            }
            Ok(n) => {
                if n < HEADER_SIZE {
                    log::warn!("Segment header is short ({} of {} bytes)", n, HEADER_SIZE);
                }
                SegmentTable::from_bytes(&header[..n])
            }
            Err(e) => {
                log::error!("Failed to read segment header, starting empty: {}", e);
                SegmentTable::default()
            }
        };

        log::info!("Loaded {} populated segments: {:?}", table.populated_count(), table.segments());

        Self {
            store,
            table,
            active: 0,
            state: SlotState::Idle,
        }
    }

    /// Write the table to the header at offset 0 and flush.
    pub fn save(&self) -> Result<(), ReplayError> {
        self.store
            .write_at(0, &self.table.to_bytes())
            .map_err(|e| ReplayError::StoreIo(format!("failed to write segment header: {}", e)))?;
        self.store
            .flush()
            .map_err(|e| ReplayError::StoreIo(format!("failed to flush segment header: {}", e)))?;
        log::debug!("Saved segment table {:?}", self.table.segments());
        Ok(())
    }

    pub fn backing(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_segment(&self) -> AudioSegment {
        self.table.segments()[self.active]
    }

    pub fn section_writer(&self, base: u64) -> SectionWriter {
        SectionWriter::new(Arc::clone(&self.store), base)
    }

    pub fn section_reader(&self, base: u64, len: u64) -> SectionReader {
        SectionReader::new(Arc::clone(&self.store), base, len)
    }

    /// Reader over the active segment, if it holds a take.
    pub fn active_reader(&self) -> Option<SectionReader> {
        let segment = self.active_segment();
        if !segment.is_populated() {
            log::warn!("Segment {} is empty: {:?}", self.active, segment);
            return None;
        }
        Some(self.section_reader(segment.start as u64, segment.len()))
    }

    /// Where a slot without an assigned start begins: the end of the store,
    /// never inside the header.
    pub fn append_position(&self) -> Result<u64, ReplayError> {
        let len = self
            .store
            .len()
            .map_err(|e| ReplayError::StoreIo(format!("failed to query store length: {}", e)))?;
        Ok(len.max(HEADER_SIZE as u64))
    }

    /// Idle → Recording on the active slot.
    ///
    /// Assigns the slot's start if it has none, then returns a writer
    /// positioned at that start.
    pub fn begin_recording(&mut self) -> Result<SectionWriter, ReplayError> {
        if let SlotState::Recording { index } = self.state {
            return Err(ReplayError::InvalidState(format!("slot {} is already recording", index)));
        }

        let index = self.active;
        let start = if self.table.segments()[index].has_start() {
            let start = self.table.segments()[index].start;
            log::info!("Re-recording slot {} from {}", index, start);
            start
        } else {
            let start = self.append_position()? as i64;
            self.slot_mut(index).start = start;
            log::info!("Slot {} starts at {}", index, start);
            start
        };

        self.state = SlotState::Recording { index };
        Ok(self.section_writer(start as u64))
    }

    /// Recording → Idle. Stores `end` for the slot being recorded and saves the table.
    pub fn finish_recording(&mut self, end: u64) -> Result<AudioSegment, ReplayError> {
        let index = self
            .state
            .recording_index()
            .ok_or_else(|| ReplayError::InvalidState("no slot is recording".into()))?;
        self.state = SlotState::Idle;

        let segment = {
            let slot = self.slot_mut(index);
            slot.end = end as i64;
            *slot
        };
        if !segment.is_populated() {
            log::warn!("Slot {} finished without audio: {:?}", index, segment);
        }
        log::info!("Slot {} recorded {:?}", index, segment);

        self.save()?;
        Ok(segment)
    }

    /// Recording → Idle without touching the table, for a recording that never started.
    pub fn abort_recording(&mut self) {
        if let SlotState::Recording { index } = self.state {
            log::warn!("Recording on slot {} aborted", index);
            self.state = SlotState::Idle;
        }
    }

    /// Advance the active slot. Past the last slot this wraps to slot 0 and
    /// resets its start to the header boundary; otherwise the new slot starts
    /// where the previous one ended.
    pub fn next_segment(&mut self) -> usize {
        self.active += 1;
        if self.active >= SEGMENT_SLOTS {
            self.active = 0;
            self.slot_mut(0).start = HEADER_SIZE as i64;
        } else {
            let previous_end = self.table.segments()[self.active - 1].end;
            self.slot_mut(self.active).start = previous_end;
        }
        log::info!("Active segment {}", self.active);
        self.active
    }

    /// Retreat the active slot. At or below slot 1 this clamps to slot 0 and
    /// resets its start to the header boundary; otherwise the new slot starts
    /// where the slot before it ended.
    pub fn previous_segment(&mut self) -> usize {
        if self.active <= 1 {
            self.active = 0;
            self.slot_mut(0).start = HEADER_SIZE as i64;
        } else {
            self.active -= 1;
            let previous_end = self.table.segments()[self.active - 1].end;
            self.slot_mut(self.active).start = previous_end;
        }
        log::info!("Active segment {}", self.active);
        self.active
    }

    /// Forget every segment and select slot 0. Persisted on the next `save`.
    pub fn reset(&mut self) -> Result<(), ReplayError> {
        if let SlotState::Recording { index } = self.state {
            return Err(ReplayError::InvalidState(format!(
                "cannot reset while slot {} is recording",
                index
            )));
        }
        self.table.clear();
        self.active = 0;
        log::info!("Segment table reset");
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> &mut AudioSegment {
        &mut self.table.segments_mut()[index]
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore")
            .field("table", &self.table)
            .field("active", &self.active)
            .field("state", &self.state)
            .finish()
    }
}
