use std::sync::Arc;

use crate::models::audio_models::EndpointInfo;
use crate::models::error::ReplayError;

/// Callback invoked by a capture source with one block of interleaved samples.
///
/// Runs on the device's real-time thread: it must not lock, allocate or log.
pub type CaptureCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// Callback invoked by a render sink to fill one output block.
///
/// Writes every sample of the block (silence where no audio is available)
/// and returns how many samples carried real audio. Runs on the device's
/// real-time thread.
pub type RenderCallback = Arc<dyn Fn(&mut [f32]) -> usize + Send + Sync + 'static>;

/// A device that produces audio, e.g. a microphone or a loopback endpoint.
pub trait CaptureSource: Send {
    /// Check that the endpoint exists and can be opened with the configured profile.
    fn probe(&mut self) -> Result<EndpointInfo, ReplayError>;

    /// Start delivering blocks to `callback`, one frame per invocation.
    fn start(&mut self, callback: CaptureCallback) -> Result<(), ReplayError>;

    /// Stop delivering. No callback may run after this returns.
    fn stop(&mut self) -> Result<(), ReplayError>;
}

/// A device that consumes audio, e.g. speakers.
pub trait RenderSink: Send {
    fn probe(&mut self) -> Result<EndpointInfo, ReplayError>;

    /// Start pulling blocks from `callback`, one frame per invocation.
    fn start(&mut self, callback: RenderCallback) -> Result<(), ReplayError>;

    /// Stop pulling. No callback may run after this returns.
    fn stop(&mut self) -> Result<(), ReplayError>;
}
