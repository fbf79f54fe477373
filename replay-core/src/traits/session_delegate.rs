use crate::models::error::ReplayError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::SessionEvent;

/// Event delegate for session notifications.
///
/// Called from the controller's thread and from worker threads, never from
/// real-time callbacks. Implementations should marshal to a UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    fn on_event(&self, event: &SessionEvent);

    /// Called when a worker hits an error. Chunk-local errors are reported
    /// too; the stream keeps going after those.
    fn on_error(&self, error: &ReplayError);

    fn on_recording_finished(&self, result: &RecordingResult);
}
