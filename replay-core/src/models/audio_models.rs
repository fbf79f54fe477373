use std::sync::atomic::{AtomicU64, Ordering};

/// Direction of an audio endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Capture,
    Render,
}

/// An audio endpoint that passed probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub name: String,
    pub kind: EndpointKind,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Counters shared with the real-time callbacks. Lock-free so they can be
/// bumped from callback context.
#[derive(Debug, Default)]
pub struct SessionDiagnostics {
    capture_callbacks: AtomicU64,
    captured_samples: AtomicU64,
    render_callbacks: AtomicU64,
    render_underruns: AtomicU64,
    frames_dropped: AtomicU64,
    packets_dropped: AtomicU64,
}

impl SessionDiagnostics {
    pub(crate) fn record_capture(&self, samples: usize) {
        self.capture_callbacks.fetch_add(1, Ordering::Relaxed);
        self.captured_samples.fetch_add(samples as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_render(&self, requested: usize, delivered: usize) {
        self.render_callbacks.fetch_add(1, Ordering::Relaxed);
        if delivered < requested {
            self.render_underruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_dropped_frame(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_packet(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            capture_callbacks: self.capture_callbacks.load(Ordering::Relaxed),
            captured_samples: self.captured_samples.load(Ordering::Relaxed),
            render_callbacks: self.render_callbacks.load(Ordering::Relaxed),
            render_underruns: self.render_underruns.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `SessionDiagnostics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub capture_callbacks: u64,
    pub captured_samples: u64,
    pub render_callbacks: u64,
    pub render_underruns: u64,
    pub frames_dropped: u64,
    pub packets_dropped: u64,
}
