use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::codec::pipeline::CodecPipeline;
use crate::models::audio_models::{DiagnosticsSnapshot, EndpointInfo, SessionDiagnostics};
use crate::models::config::SessionConfig;
use crate::models::error::ReplayError;
use crate::models::recording_result::{RecordingResult, RecordingStats, ReplayStats};
use crate::models::state::SessionEvent;
use crate::processing::backoff::Backoff;
use crate::processing::ring_buffer::SampleRingBuffer;
use crate::processing::transfer_queue::TransferQueue;
use crate::session::cancel::CancellationToken;
use crate::session::probe::probe_endpoints;
use crate::storage::framing::{read_packet, write_packet};
use crate::storage::section::SectionReader;
use crate::storage::segment_store::SegmentStore;
use crate::traits::endpoint::{CaptureCallback, CaptureSource, RenderCallback, RenderSink};
use crate::traits::session_delegate::SessionDelegate;

const DRAIN_THREAD: &str = "replay-drain";
const ENCODE_THREAD: &str = "replay-encode";
const DECODE_THREAD: &str = "replay-decode";

type Delegate = Option<Arc<dyn SessionDelegate>>;

/// What the encode thread hands back. Stats survive a storage failure so the
/// segment end can still be recorded.
struct EncodeOutcome {
    stats: RecordingStats,
    error: Option<ReplayError>,
}

/// Worker handles of an active recording.
struct RecordingSession {
    slot: Option<usize>,
    base: u64,
    /// Set by the encoder when the sink fails; the session is halted from then on.
    failed: Arc<AtomicBool>,
    drain_token: CancellationToken,
    drain_handle: JoinHandle<()>,
    encode_token: CancellationToken,
    encode_handle: JoinHandle<EncodeOutcome>,
}

impl RecordingSession {
    /// Drain first so everything still in the ring reaches the queue, then
    /// let the encoder flush the queue.
    fn finish(self) -> Result<EncodeOutcome, ReplayError> {
        self.drain_token.cancel();
        join_worker(DRAIN_THREAD, self.drain_handle)?;
        self.encode_token.cancel();
        join_worker(ENCODE_THREAD, self.encode_handle)
    }
}

/// Worker handle of an active replay.
struct ReplaySession {
    slot: Option<usize>,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    handle: JoinHandle<Result<ReplayStats, ReplayError>>,
}

impl ReplaySession {
    fn finish(self) -> Result<ReplayStats, ReplayError> {
        self.token.cancel();
        join_worker(DECODE_THREAD, self.handle)?
    }
}

/// Where replayed packets come from.
enum ReplaySource {
    Stream(Box<dyn Read + Send>),
    Segment { reader: SectionReader, looping: bool },
}

impl ReplaySource {
    fn reader(&mut self) -> &mut dyn Read {
        match self {
            ReplaySource::Stream(reader) => reader.as_mut(),
            ReplaySource::Segment { reader, .. } => reader,
        }
    }

    fn is_looping(&self) -> bool {
        matches!(self, ReplaySource::Segment { looping: true, .. })
    }

    /// Rewind a looping segment. Returns false for anything that plays once.
    fn restart(&mut self) -> bool {
        match self {
            ReplaySource::Segment { reader, looping: true } => {
                reader.rewind();
                true
            }
            _ => false,
        }
    }
}

/// Record/replay orchestrator over one capture source and one render sink.
///
/// ```text
/// record:  [CaptureSource] → [SampleRingBuffer] → drain → [TransferQueue]
///                                     → encode → [CodecPipeline] → framed sink
/// replay:  framed source → decode → [CodecPipeline] → [SampleRingBuffer] → [RenderSink]
/// ```
///
/// Recording and replay run independently and may overlap. With a
/// `SegmentStore` attached, takes go into the active slot and replay reads
/// from it.
pub struct SessionController<C: CaptureSource, R: RenderSink> {
    config: SessionConfig,
    source: C,
    sink: R,
    capture_endpoint: EndpointInfo,
    render_endpoint: EndpointInfo,
    capture_ring: Arc<SampleRingBuffer>,
    render_ring: Arc<SampleRingBuffer>,
    queue: Arc<TransferQueue>,
    diagnostics: Arc<SessionDiagnostics>,
    delegate: Delegate,
    segments: Option<SegmentStore>,
    recording: Option<RecordingSession>,
    replay: Option<ReplaySession>,
}

impl<C: CaptureSource, R: RenderSink> SessionController<C, R> {
    /// Validate `config` and probe both endpoints.
    ///
    /// Probing is retried `config.probe_attempts` times; if either endpoint
    /// never answers the result is `DeviceUnavailable` with every failure.
    pub fn connect(config: SessionConfig, mut source: C, mut sink: R) -> Result<Self, ReplayError> {
        config.validate().map_err(ReplayError::ConfigurationFailed)?;
        // Fail early on a codec this build cannot provide.
        let pipeline = CodecPipeline::from_config(&config)?;

        let (capture_endpoint, render_endpoint) = probe_endpoints(
            &mut source,
            &mut sink,
            config.probe_attempts,
            Duration::from_millis(config.probe_interval_ms),
        )?;

        for endpoint in [&capture_endpoint, &render_endpoint] {
            if endpoint.sample_rate != config.profile.sample_rate || endpoint.channels != config.profile.channels {
                log::warn!(
                    "Endpoint {} runs at {} Hz x{}, session expects {} Hz x{}",
                    endpoint.name,
                    endpoint.sample_rate,
                    endpoint.channels,
                    config.profile.sample_rate,
                    config.profile.channels
                );
            }
        }
        log::info!("Session connected: {}", pipeline.describe());

        Ok(Self {
            capture_ring: Arc::new(SampleRingBuffer::new(config.ring_capacity)),
            render_ring: Arc::new(SampleRingBuffer::new(config.ring_capacity)),
            queue: Arc::new(TransferQueue::new(config.ring_capacity)),
            diagnostics: Arc::new(SessionDiagnostics::default()),
            delegate: None,
            segments: None,
            recording: None,
            replay: None,
            config,
            source,
            sink,
            capture_endpoint,
            render_endpoint,
        })
    }

    /// Attach a segment store for `record_segment` / `replay_segment`.
    pub fn with_segment_store(mut self, store: SegmentStore) -> Self {
        self.segments = Some(store);
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn capture_endpoint(&self) -> &EndpointInfo {
        &self.capture_endpoint
    }

    pub fn render_endpoint(&self) -> &EndpointInfo {
        &self.render_endpoint
    }

    pub fn segment_store(&self) -> Option<&SegmentStore> {
        self.segments.as_ref()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// False once the encoder has hit a storage failure, even before
    /// `stop_recording` collects the error.
    pub fn is_recording(&self) -> bool {
        self.recording
            .as_ref()
            .is_some_and(|session| !session.failed.load(Ordering::Acquire))
    }

    /// True while a replay has data left. A non-looping replay turns false on
    /// its own once the sink has played everything out.
    pub fn is_playing(&self) -> bool {
        self.replay
            .as_ref()
            .is_some_and(|session| !session.finished.load(Ordering::Acquire))
    }

    // --- Recording ---

    /// Record framed packets into `sink` until `stop_recording`.
    pub fn start_recording<W: Write + Send + 'static>(&mut self, sink: W) -> Result<bool, ReplayError> {
        if self.is_recording() {
            log::debug!("Already recording");
            return Ok(true);
        }
        self.reap_failed_recording();
        self.begin_recording(Box::new(sink), None, 0)?;
        Ok(true)
    }

    /// Record into the active slot of the attached segment store.
    pub fn record_segment(&mut self) -> Result<bool, ReplayError> {
        if self.is_recording() {
            log::debug!("Already recording");
            return Ok(true);
        }
        self.reap_failed_recording();
        let store = self.segments.as_mut().ok_or_else(no_segment_store)?;
        let writer = store.begin_recording()?;
        let slot = store.active_index();
        let base = writer.base();

        if let Err(e) = self.begin_recording(Box::new(writer), Some(slot), base) {
            if let Some(store) = self.segments.as_mut() {
                store.abort_recording();
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Stop capture, flush every buffered sample and close out the take.
    ///
    /// A storage failure hit by the encoder is returned here, after the
    /// segment (if any) has been closed at the last complete packet.
    pub fn stop_recording(&mut self) -> Result<RecordingResult, ReplayError> {
        let session = self
            .recording
            .take()
            .ok_or_else(|| ReplayError::InvalidState("not recording".into()))?;
        let slot = session.slot;
        let base = session.base;

        if let Err(e) = self.source.stop() {
            log::warn!("Capture source did not stop cleanly: {}", e);
        }

        let (stats, error) = match session.finish() {
            Ok(outcome) => (outcome.stats, outcome.error),
            Err(e) => (RecordingStats::default(), Some(e)),
        };

        let segment = match slot {
            Some(_) => {
                let closed = self
                    .segments
                    .as_mut()
                    .ok_or_else(no_segment_store)
                    .and_then(|store| store.finish_recording(base + stats.bytes_written));
                match closed {
                    Ok(segment) => Some(segment),
                    Err(e) => {
                        log::error!("Failed to close segment {:?}: {}", slot, e);
                        if let Some(ref encode_error) = error {
                            log::error!("Recording ended with error: {}", encode_error);
                        }
                        self.emit(SessionEvent::RecordingStopped { slot });
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        self.emit(SessionEvent::RecordingStopped { slot });
        if let Some(e) = error {
            log::error!("Recording ended with error: {}", e);
            return Err(e);
        }

        let duration = self.config.profile.duration_of(stats.samples_encoded);
        log::info!(
            "Recording stopped: {} packets, {} bytes, {:.2}s",
            stats.packets_written,
            stats.bytes_written,
            duration
        );
        let result = RecordingResult::new(slot, segment, duration, stats);
        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_finished(&result);
        }
        Ok(result)
    }

    /// Collect a recording halted by a storage failure so a new one can start.
    fn reap_failed_recording(&mut self) {
        if self.recording.is_some() {
            if let Err(e) = self.stop_recording() {
                log::warn!("Previous recording ended with error: {}", e);
            }
        }
    }

    fn begin_recording(
        &mut self,
        writer: Box<dyn Write + Send>,
        slot: Option<usize>,
        base: u64,
    ) -> Result<(), ReplayError> {
        let pipeline = CodecPipeline::from_config(&self.config)?;
        self.capture_ring.reset();
        self.queue.clear();

        let failed = Arc::new(AtomicBool::new(false));
        let drain_token = CancellationToken::new();
        let drain_handle = {
            let ring = Arc::clone(&self.capture_ring);
            let queue = Arc::clone(&self.queue);
            let token = drain_token.clone();
            let failed = Arc::clone(&failed);
            spawn_worker(DRAIN_THREAD, move || drain_loop(&ring, &queue, &token, &failed))?
        };

        let encode_token = CancellationToken::new();
        let encode_handle = {
            let queue = Arc::clone(&self.queue);
            let token = encode_token.clone();
            let diagnostics = Arc::clone(&self.diagnostics);
            let delegate = self.delegate.clone();
            let failed = Arc::clone(&failed);
            spawn_worker(ENCODE_THREAD, move || {
                encode_loop(pipeline, &queue, writer, &token, &failed, &diagnostics, &delegate)
            })
        };
        let encode_handle = match encode_handle {
            Ok(handle) => handle,
            Err(e) => {
                drain_token.cancel();
                let _ = drain_handle.join();
                return Err(e);
            }
        };

        let session = RecordingSession {
            slot,
            base,
            failed,
            drain_token,
            drain_handle,
            encode_token,
            encode_handle,
        };

        let callback: CaptureCallback = {
            let ring = Arc::clone(&self.capture_ring);
            let diagnostics = Arc::clone(&self.diagnostics);
            Arc::new(move |samples: &[f32]| {
                diagnostics.record_capture(samples.len());
                ring.write(samples);
            })
        };
        if let Err(e) = self.source.start(callback) {
            log::error!("Capture source failed to start: {}", e);
            match session.finish() {
                Ok(EncodeOutcome { error: Some(encode_error), .. }) => {
                    log::warn!("Encoder of the aborted recording failed: {}", encode_error)
                }
                Ok(_) => {}
                Err(join_error) => log::warn!("Recording workers did not shut down cleanly: {}", join_error),
            }
            return Err(e);
        }

        self.recording = Some(session);
        log::info!("Recording started (slot {:?})", slot);
        self.emit(SessionEvent::RecordingStarted { slot });
        Ok(())
    }

    // --- Replay ---

    /// Replay framed packets from `source` once.
    pub fn start_replay<Rd: Read + Send + 'static>(&mut self, source: Rd) -> Result<bool, ReplayError> {
        if self.is_playing() {
            log::debug!("Already playing");
            return Ok(true);
        }
        self.reap_finished_replay();
        self.begin_replay(ReplaySource::Stream(Box::new(source)), None)?;
        Ok(true)
    }

    /// Replay the active slot, looping if `loop_segment_replay` is set.
    pub fn replay_segment(&mut self) -> Result<bool, ReplayError> {
        if self.is_playing() {
            log::debug!("Already playing");
            return Ok(true);
        }
        self.reap_finished_replay();

        let store = self.segments.as_ref().ok_or_else(no_segment_store)?;
        let slot = store.active_index();
        let reader = store
            .active_reader()
            .ok_or_else(|| ReplayError::InvalidState(format!("segment {} is empty", slot)))?;
        let source = ReplaySource::Segment {
            reader,
            looping: self.config.loop_segment_replay,
        };
        self.begin_replay(source, Some(slot))?;
        Ok(true)
    }

    /// Stop replay and return what the decoder did.
    pub fn stop_replay(&mut self) -> Result<ReplayStats, ReplayError> {
        let session = self
            .replay
            .take()
            .ok_or_else(|| ReplayError::InvalidState("not playing".into()))?;
        let result = session.finish();

        if let Err(e) = self.sink.stop() {
            log::warn!("Render sink did not stop cleanly: {}", e);
        }
        self.render_ring.reset();
        self.emit(SessionEvent::ReplayStopped);

        let stats = result?;
        log::info!(
            "Replay stopped: {} packets decoded, {} dropped, {} loops",
            stats.packets_decoded,
            stats.packets_dropped,
            stats.loops
        );
        Ok(stats)
    }

    /// Tear down a replay that finished by itself but was never stopped.
    fn reap_finished_replay(&mut self) {
        if self.replay.is_some() {
            if let Err(e) = self.stop_replay() {
                log::warn!("Previous replay ended with error: {}", e);
            }
        }
    }

    fn begin_replay(&mut self, source: ReplaySource, slot: Option<usize>) -> Result<(), ReplayError> {
        let pipeline = CodecPipeline::from_config(&self.config)?;
        self.render_ring.reset();

        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let handle = {
            let ring = Arc::clone(&self.render_ring);
            let token = token.clone();
            let finished = Arc::clone(&finished);
            let diagnostics = Arc::clone(&self.diagnostics);
            let delegate = self.delegate.clone();
            let frame_duration = self.config.profile.frame_duration();
            spawn_worker(DECODE_THREAD, move || {
                let result = decode_loop(pipeline, source, &ring, &token, &diagnostics, &delegate);
                if let Err(ref e) = result {
                    log::error!("Replay failed: {}", e);
                    if let Some(ref d) = delegate {
                        d.on_error(e);
                    }
                }
                if !token.is_cancelled() {
                    // Let the sink play out what is queued before reporting done.
                    while !token.is_cancelled() && !ring.is_empty() {
                        thread::sleep(Backoff::SLEEP);
                    }
                    if !token.is_cancelled() {
                        thread::sleep(frame_duration);
                    }
                    finished.store(true, Ordering::Release);
                    notify(&delegate, &SessionEvent::ReplayFinished);
                }
                result
            })?
        };

        let session = ReplaySession {
            slot,
            token,
            finished,
            handle,
        };

        let callback: RenderCallback = {
            let ring = Arc::clone(&self.render_ring);
            let diagnostics = Arc::clone(&self.diagnostics);
            Arc::new(move |out: &mut [f32]| {
                let n = ring.read(out);
                out[n..].fill(0.0);
                diagnostics.record_render(out.len(), n);
                n
            })
        };
        if let Err(e) = self.sink.start(callback) {
            log::error!("Render sink failed to start: {}", e);
            if let Err(decode_error) = session.finish() {
                log::warn!("Decode worker of the aborted replay failed: {}", decode_error);
            }
            return Err(e);
        }

        log::info!("Replay started (slot {:?})", session.slot);
        self.replay = Some(session);
        self.emit(SessionEvent::ReplayStarted { slot });
        Ok(())
    }

    // --- Segment navigation ---

    pub fn next_segment(&mut self) -> Result<usize, ReplayError> {
        let index = self.segments.as_mut().ok_or_else(no_segment_store)?.next_segment();
        self.emit(SessionEvent::ActiveSegmentChanged { index });
        Ok(index)
    }

    pub fn previous_segment(&mut self) -> Result<usize, ReplayError> {
        let index = self.segments.as_mut().ok_or_else(no_segment_store)?.previous_segment();
        self.emit(SessionEvent::ActiveSegmentChanged { index });
        Ok(index)
    }

    /// Clear every slot and persist the empty table.
    pub fn reset_segments(&mut self) -> Result<(), ReplayError> {
        let store = self.segments.as_mut().ok_or_else(no_segment_store)?;
        store.reset()?;
        store.save()?;
        self.emit(SessionEvent::ActiveSegmentChanged { index: 0 });
        Ok(())
    }

    /// Stop both directions and persist the segment table.
    ///
    /// Everything is attempted; the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), ReplayError> {
        let mut first_error = None;

        if self.recording.is_some() {
            if let Err(e) = self.stop_recording() {
                first_error.get_or_insert(e);
            }
        }
        if self.replay.is_some() {
            if let Err(e) = self.stop_replay() {
                first_error.get_or_insert(e);
            }
        }
        if let Some(ref store) = self.segments {
            if let Err(e) = store.save() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn emit(&self, event: SessionEvent) {
        notify(&self.delegate, &event);
    }
}

impl<C: CaptureSource, R: RenderSink> Drop for SessionController<C, R> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Session shutdown failed: {}", e);
        }
    }
}

// --- Workers ---

/// Move samples from the real-time ring into the transfer queue.
///
/// After cancellation it keeps going until the ring reads empty, so nothing
/// the source delivered before it stopped is lost. Once the encoder has
/// failed it empties the queue and discards everything it reads, which keeps
/// the capture callback from blocking without letting the queue grow.
fn drain_loop(ring: &SampleRingBuffer, queue: &TransferQueue, token: &CancellationToken, failed: &AtomicBool) {
    let mut scratch = vec![0.0f32; ring.capacity()];
    let mut drained = 0u64;
    let mut discarded = 0u64;
    let mut discarding = false;
    loop {
        let cancelled = token.is_cancelled();
        if !discarding && failed.load(Ordering::Acquire) {
            log::warn!("Encoder failed, discarding captured audio");
            queue.clear();
            discarding = true;
        }
        let n = ring.read(&mut scratch);
        if n > 0 {
            if discarding {
                discarded += n as u64;
            } else {
                queue.push(&scratch[..n]);
                drained += n as u64;
            }
            continue;
        }
        if cancelled {
            break;
        }
        thread::sleep(Backoff::SLEEP);
    }
    log::debug!("Drain finished after {} samples ({} discarded)", drained, discarded);
}

/// Pop whole frames off the queue, encode and frame them into `writer`.
///
/// A frame the codec rejects is dropped and counted. A write failure sets
/// `failed` and ends the loop; the stats gathered so far are returned with
/// the error.
fn encode_loop(
    mut pipeline: CodecPipeline,
    queue: &TransferQueue,
    mut writer: Box<dyn Write + Send>,
    token: &CancellationToken,
    failed: &AtomicBool,
    diagnostics: &SessionDiagnostics,
    delegate: &Delegate,
) -> EncodeOutcome {
    let frame_len = pipeline.samples_per_frame();
    let mut frame = vec![0.0f32; frame_len];
    let mut stats = RecordingStats::default();
    let mut hasher = Sha256::new();

    let result = (|| -> Result<(), ReplayError> {
        loop {
            let cancelled = token.is_cancelled();
            if queue.len() >= frame_len {
                queue.pop(&mut frame);
                encode_frame(&mut pipeline, &frame, writer.as_mut(), &mut stats, &mut hasher, diagnostics, delegate)?;
                continue;
            }
            if cancelled {
                break;
            }
            thread::sleep(Backoff::SLEEP);
        }

        let rest = queue.pop(&mut frame);
        if rest > 0 {
            log::debug!("Padding final frame with {} samples of silence", frame_len - rest);
            frame[rest..].fill(0.0);
            encode_frame(&mut pipeline, &frame, writer.as_mut(), &mut stats, &mut hasher, diagnostics, delegate)?;
        }
        writer.flush()?;
        Ok(())
    })();

    stats.checksum = hex_encode(&hasher.finalize());
    let error = result.err();
    if let Some(ref e) = error {
        failed.store(true, Ordering::Release);
        log::error!("Encoder stopped: {}", e);
        if let Some(ref d) = delegate {
            d.on_error(e);
        }
    }
    EncodeOutcome { stats, error }
}

fn encode_frame(
    pipeline: &mut CodecPipeline,
    frame: &[f32],
    writer: &mut (dyn Write + Send),
    stats: &mut RecordingStats,
    hasher: &mut Sha256,
    diagnostics: &SessionDiagnostics,
    delegate: &Delegate,
) -> Result<(), ReplayError> {
    let packet = match pipeline.compress(frame) {
        Ok(packet) => packet,
        Err(e) if e.is_chunk_local() => {
            log::warn!("Dropping frame: {}", e);
            stats.frames_dropped += 1;
            diagnostics.record_dropped_frame();
            if let Some(ref d) = delegate {
                d.on_error(&e);
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let written = write_packet(writer, &packet)?;
    hasher.update((packet.len() as u32).to_le_bytes());
    hasher.update(&packet);
    stats.packets_written += 1;
    stats.bytes_written += written;
    stats.samples_encoded += frame.len() as u64;
    Ok(())
}

/// Read, decode and queue packets for the render sink.
///
/// A packet the codec rejects is skipped. A truncated or unframeable stream
/// ends the current pass. Anything else, a storage failure in practice, is
/// an error.
fn decode_loop(
    mut pipeline: CodecPipeline,
    mut source: ReplaySource,
    ring: &SampleRingBuffer,
    token: &CancellationToken,
    diagnostics: &SessionDiagnostics,
    delegate: &Delegate,
) -> Result<ReplayStats, ReplayError> {
    let target = pipeline.samples_per_frame();
    let mut stats = ReplayStats::default();
    let mut decoded_at_pass_start = 0u64;

    while !token.is_cancelled() {
        let packet = match read_packet(source.reader()) {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                if next_pass(&mut source, &mut stats, &mut decoded_at_pass_start) {
                    continue;
                }
                break;
            }
            Err(e @ (ReplayError::TruncatedStream { .. } | ReplayError::DecodeError(_))) => {
                log::warn!("Ending stream: {}", e);
                stats.truncated_streams += 1;
                if let Some(ref d) = delegate {
                    d.on_error(&e);
                }
                if next_pass(&mut source, &mut stats, &mut decoded_at_pass_start) {
                    continue;
                }
                break;
            }
            Err(e) => return Err(e),
        };

        match pipeline.decompress(&packet, target) {
            Ok(pcm) => {
                let written = ring.write_until(&pcm, || token.is_cancelled());
                stats.packets_decoded += 1;
                stats.samples_queued += written as u64;
            }
            Err(e) if e.is_chunk_local() => {
                log::warn!("Dropping packet: {}", e);
                stats.packets_dropped += 1;
                diagnostics.record_dropped_packet();
                if let Some(ref d) = delegate {
                    d.on_error(&e);
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}

/// Start another pass over a looping source. A pass that decoded nothing
/// would spin forever, so looping stops there.
fn next_pass(source: &mut ReplaySource, stats: &mut ReplayStats, decoded_at_pass_start: &mut u64) -> bool {
    if stats.packets_decoded == *decoded_at_pass_start {
        if source.is_looping() {
            log::warn!("Segment has nothing decodable, not looping");
        }
        return false;
    }
    if !source.restart() {
        return false;
    }
    stats.loops += 1;
    *decoded_at_pass_start = stats.packets_decoded;
    true
}

fn notify(delegate: &Delegate, event: &SessionEvent) {
    if let Some(ref d) = delegate {
        d.on_event(event);
    }
}

fn spawn_worker<T, F>(name: &str, f: F) -> Result<JoinHandle<T>, ReplayError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .map_err(|e| ReplayError::InvalidState(format!("failed to spawn {} thread: {}", name, e)))
}

fn join_worker<T>(name: &str, handle: JoinHandle<T>) -> Result<T, ReplayError> {
    handle
        .join()
        .map_err(|_| ReplayError::InvalidState(format!("{} thread panicked", name)))
}

fn no_segment_store() -> ReplayError {
    ReplayError::InvalidState("no segment store attached".into())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
