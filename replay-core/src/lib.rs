//! # replay-core
//!
//! Segment-addressed audio record/replay core.
//!
//! Captured audio is cut into fixed-duration frames, quantized to 16-bit PCM,
//! compressed and written as length-prefixed packets, either to any byte sink
//! or into one of three segment slots of a backing store. Replay reads the
//! packets back, decodes them and feeds a render endpoint. Device backends
//! implement `CaptureSource` / `RenderSink` and plug into the generic
//! `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! replay-core (this crate)
//! ├── traits/       ← CaptureSource, RenderSink, SessionDelegate
//! ├── models/       ← ReplayError, SessionConfig, AudioProfile, SegmentTable, results
//! ├── processing/   ← SampleRingBuffer, TransferQueue, PCM conversion, backoff
//! ├── codec/        ← FrameCodec, ByteCompressor, CodecPipeline
//! ├── session/      ← SessionController, endpoint probing, cancellation
//! └── storage/      ← BackingStore, packet framing, SegmentStore
//! ```

pub mod codec;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use codec::compressor::ZstdCompressor;
#[cfg(feature = "opus")]
pub use codec::opus::OpusCodec;
pub use codec::pcm16::Pcm16Codec;
pub use codec::pipeline::CodecPipeline;
pub use codec::{ByteCompressor, FrameCodec};
pub use models::audio_models::{DiagnosticsSnapshot, EndpointInfo, EndpointKind};
pub use models::config::{AudioProfile, CodecKind, SessionConfig};
pub use models::error::ReplayError;
pub use models::recording_result::{RecordingResult, RecordingStats, ReplayStats};
pub use models::segment::{AudioSegment, SegmentTable};
pub use models::state::{SessionEvent, SlotState};
pub use processing::ring_buffer::SampleRingBuffer;
pub use processing::transfer_queue::TransferQueue;
pub use session::cancel::CancellationToken;
pub use session::controller::SessionController;
pub use storage::backing::{BackingStore, FileStore, MemoryStore};
pub use storage::segment_store::SegmentStore;
pub use traits::endpoint::{CaptureCallback, CaptureSource, RenderCallback, RenderSink};
pub use traits::session_delegate::SessionDelegate;
