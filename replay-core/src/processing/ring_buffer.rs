use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::backoff::Backoff;

/// Single-producer single-consumer ring buffer for audio samples.
///
/// Sits between a real-time device callback and a processing thread. Both
/// sides take `&self`; share it with `Arc<SampleRingBuffer>`.
///
/// Two monotonically increasing cursors track progress and storage is
/// indexed with `cursor % capacity`. The cursors are the only
/// synchronization point: the writer publishes with a release store on
/// `write_cursor` and the reader frees space with a release store on
/// `read_cursor`. Slots hold `f32` bits and are accessed relaxed.
///
/// Overflow behavior: the writer waits for space, samples are never dropped.
#[derive(Debug)]
pub struct SampleRingBuffer {
    slots: Box<[AtomicU32]>,
    capacity: u64,
    write_cursor: AtomicU64,
    read_cursor: AtomicU64,
}

impl SampleRingBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            slots: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            capacity: capacity as u64,
            write_cursor: AtomicU64::new(0),
            read_cursor: AtomicU64::new(0),
        }
    }

    /// Write every sample, in order, waiting for space whenever the buffer is full.
    ///
    /// Samples become visible to the reader in chunks as space frees, so a
    /// reader can observe part of a call before it returns.
    pub fn write(&self, samples: &[f32]) {
        self.write_until(samples, || false);
    }

    /// Like [`write`](Self::write), but stops waiting for space once `abort`
    /// returns true. Returns how many samples were written.
    pub fn write_until(&self, samples: &[f32], mut abort: impl FnMut() -> bool) -> usize {
        let mut written = 0usize;
        let mut backoff = Backoff::new();

        while written < samples.len() {
            // Only this side moves the write cursor.
            let w = self.write_cursor.load(Ordering::Relaxed);
            let r = self.read_cursor.load(Ordering::Acquire);
            let free = self.capacity - (w - r);

            if free == 0 {
                if abort() {
                    break;
                }
                backoff.snooze();
                continue;
            }

            let n = free.min((samples.len() - written) as u64);
            for i in 0..n {
                let slot = ((w + i) % self.capacity) as usize;
                self.slots[slot].store(samples[written + i as usize].to_bits(), Ordering::Relaxed);
            }
            self.write_cursor.store(w + n, Ordering::Release);

            written += n as usize;
            backoff.reset();
        }

        written
    }

    /// Read up to `dest.len()` samples. Never blocks.
    ///
    /// Returns the number of samples copied; the rest of `dest` is untouched.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let w = self.write_cursor.load(Ordering::Acquire);
        // Only this side moves the read cursor.
        let r = self.read_cursor.load(Ordering::Relaxed);
        let n = (w - r).min(dest.len() as u64);

        for (i, sample) in dest.iter_mut().take(n as usize).enumerate() {
            let slot = ((r + i as u64) % self.capacity) as usize;
            *sample = f32::from_bits(self.slots[slot].load(Ordering::Relaxed));
        }
        self.read_cursor.store(r + n, Ordering::Release);

        n as usize
    }

    /// Reset both cursors to zero.
    ///
    /// Only call while no reader or writer is active.
    pub fn reset(&self) {
        self.write_cursor.store(0, Ordering::Release);
        self.read_cursor.store(0, Ordering::Release);
    }

    /// Samples written but not yet read.
    pub fn len(&self) -> usize {
        let r = self.read_cursor.load(Ordering::Acquire);
        let w = self.write_cursor.load(Ordering::Acquire);
        w.saturating_sub(r).min(self.capacity) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free_space(&self) -> usize {
        self.capacity() - self.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn read_n(buf: &SampleRingBuffer, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n];
        let got = buf.read(&mut out);
        out.truncate(got);
        out
    }

    #[test]
    fn basic_write_read() {
        let buf = SampleRingBuffer::new(10);
        buf.write(&[1.0, 2.0, 3.0]);

        assert_eq!(buf.len(), 3);
        assert_eq!(read_n(&buf, 3), vec![1.0, 2.0, 3.0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn read_partial() {
        let buf = SampleRingBuffer::new(10);
        buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(read_n(&buf, 3), vec![1.0, 2.0, 3.0]);
        assert_eq!(buf.len(), 2);

        let mut dest = [9.0f32; 10];
        assert_eq!(buf.read(&mut dest), 2);
        assert_eq!(&dest[..2], &[4.0, 5.0]);
        assert_eq!(dest[2], 9.0); // untouched past n
        assert!(buf.is_empty());
    }

    #[test]
    fn wraparound() {
        let buf = SampleRingBuffer::new(4);

        buf.write(&[1.0, 2.0, 3.0]);
        read_n(&buf, 2);

        buf.write(&[4.0, 5.0, 6.0]); // wraps around

        assert_eq!(buf.len(), 4);
        assert_eq!(buf.free_space(), 0);
        assert_eq!(read_n(&buf, 4), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn fifo_across_many_small_cycles() {
        let buf = SampleRingBuffer::new(7);
        let mut expected = Vec::new();
        let mut actual = Vec::new();
        let mut next = 0.0f32;

        for round in 0..50 {
            let chunk: Vec<f32> = (0..(round % 6 + 1))
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            buf.write(&chunk);
            expected.extend_from_slice(&chunk);
            actual.extend(read_n(&buf, 4));
        }
        actual.extend(read_n(&buf, 7));

        assert_eq!(actual, expected);
    }

    #[test]
    fn reset_clears_buffer() {
        let buf = SampleRingBuffer::new(10);
        buf.write(&[1.0, 2.0, 3.0]);
        buf.reset();

        assert!(buf.is_empty());
        assert!(read_n(&buf, 10).is_empty());

        buf.write(&[7.0]);
        assert_eq!(read_n(&buf, 10), vec![7.0]);
    }

    #[test]
    fn empty_operations() {
        let buf = SampleRingBuffer::new(10);

        assert!(read_n(&buf, 5).is_empty());
        buf.write(&[]);
        assert!(buf.is_empty());
        assert_eq!(buf.read(&mut []), 0);
    }

    #[test]
    fn write_until_gives_up_when_full() {
        let buf = SampleRingBuffer::new(4);
        let written = buf.write_until(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], || true);

        assert_eq!(written, 4);
        assert_eq!(read_n(&buf, 8), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn full_writer_blocks_until_reader_frees_space() {
        let buf = Arc::new(SampleRingBuffer::new(8192));
        let input: Vec<f32> = (0..8193).map(|i| i as f32).collect();

        let writer = {
            let buf = Arc::clone(&buf);
            let input = input.clone();
            thread::spawn(move || buf.write(&input))
        };

        // Writer fills the buffer and then has to wait for the 8193rd slot.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(buf.len(), 8192);
        assert!(!writer.is_finished());

        let mut output = read_n(&buf, 100);
        writer.join().unwrap();

        assert!(buf.len() <= buf.capacity());
        output.extend(read_n(&buf, 8192));
        assert_eq!(output, input);
    }

    #[test]
    fn concurrent_stream_is_gap_free_and_ordered() {
        const TOTAL: usize = 200_000;
        let buf = Arc::new(SampleRingBuffer::new(1024));

        let writer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let samples: Vec<f32> = (0..TOTAL).map(|i| i as f32).collect();
                for chunk in samples.chunks(333) {
                    buf.write(chunk);
                }
            })
        };

        let mut received = Vec::with_capacity(TOTAL);
        let mut scratch = vec![0.0f32; 500];
        while received.len() < TOTAL {
            assert!(buf.len() <= buf.capacity());
            let n = buf.read(&mut scratch);
            if n == 0 {
                thread::yield_now();
            }
            received.extend_from_slice(&scratch[..n]);
        }
        writer.join().unwrap();

        assert!(received.iter().enumerate().all(|(i, &s)| s == i as f32));
    }
}
