use std::collections::VecDeque;

use parking_lot::Mutex;

/// Lock-protected FIFO of samples between the ring buffer drain and the encoder.
///
/// Unbounded: the drain pushes whatever it read, the encoder pops whole
/// frames. Never touched from real-time callbacks.
#[derive(Debug, Default)]
pub struct TransferQueue {
    samples: Mutex<VecDeque<f32>>,
}

impl TransferQueue {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(initial_capacity)),
        }
    }

    /// Append samples to the back of the queue.
    pub fn push(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        self.samples.lock().extend(samples.iter().copied());
    }

    /// Move up to `dest.len()` of the oldest samples into `dest`.
    ///
    /// Returns the number copied, 0 if the queue is empty.
    pub fn pop(&self, dest: &mut [f32]) -> usize {
        let mut samples = self.samples.lock();
        let n = dest.len().min(samples.len());
        for (slot, sample) in dest.iter_mut().zip(samples.drain(..n)) {
            *slot = sample;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_is_fifo() {
        let queue = TransferQueue::new(4);
        queue.push(&[1.0, 2.0, 3.0]);
        queue.push(&[4.0, 5.0]);

        let mut dest = [0.0f32; 4];
        assert_eq!(queue.pop(&mut dest), 4);
        assert_eq!(dest, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.pop(&mut dest), 1);
        assert_eq!(dest[0], 5.0);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_on_empty_returns_zero() {
        let queue = TransferQueue::new(0);
        let mut dest = [7.0f32; 3];
        assert_eq!(queue.pop(&mut dest), 0);
        assert_eq!(dest, [7.0; 3]);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let queue = TransferQueue::new(2);
        let input: Vec<f32> = (0..10_000).map(|i| i as f32).collect();
        queue.push(&input);
        assert_eq!(queue.len(), 10_000);

        let mut out = vec![0.0f32; 10_000];
        assert_eq!(queue.pop(&mut out), 10_000);
        assert_eq!(out, input);
    }

    #[test]
    fn clear_discards_everything() {
        let queue = TransferQueue::new(8);
        queue.push(&[1.0, 2.0]);
        queue.clear();
        assert!(queue.is_empty());
    }
}
