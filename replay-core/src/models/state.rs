/// Recording state of the segment table.
///
/// State transitions:
/// ```text
/// idle → recording{index} → idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Recording { index: usize },
}

impl SlotState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Slot being recorded, if any.
    pub fn recording_index(&self) -> Option<usize> {
        match self {
            Self::Recording { index } => Some(*index),
            Self::Idle => None,
        }
    }
}

/// Notifications emitted by the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RecordingStarted { slot: Option<usize> },
    RecordingStopped { slot: Option<usize> },
    ReplayStarted { slot: Option<usize> },
    /// A non-looping replay drained its source.
    ReplayFinished,
    ReplayStopped,
    ActiveSegmentChanged { index: usize },
}
