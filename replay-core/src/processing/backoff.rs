use std::thread;
use std::time::Duration;

/// Escalating wait used when a buffer is momentarily full or empty.
///
/// The first few snoozes only yield the thread; after that each snooze
/// sleeps for `SLEEP` and the cycle starts over, so a waiter never spins
/// hot for long and never waits much more than a millisecond to notice
/// progress.
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const YIELD_LIMIT: u32 = 10;
    pub const SLEEP: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn snooze(&mut self) {
        self.step += 1;
        if self.step < Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(Self::SLEEP);
            self.step = 0;
        }
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }
}
