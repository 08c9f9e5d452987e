//! Thread-safe batch mailbox between the capture loop and the segment writer

use crate::types::FrameBatch;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Unbounded FIFO mailbox of frame batches.
///
/// The lock is held only for the enqueue/dequeue itself, never across frame
/// or encoder I/O. A batch's ownership transfers wholly to the consumer at
/// pop time, so a consumed batch cannot be observed twice.
pub struct SegmentQueue {
    inner: Mutex<VecDeque<FrameBatch>>,
    cv: Condvar,
}

impl SegmentQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
        }
    }

    /// Enqueue a batch. Always succeeds; wakes one waiting consumer.
    pub fn push(&self, batch: FrameBatch) {
        let mut g = self.inner.lock().expect("lock poisoned");
        g.push_back(batch);
        self.cv.notify_one();
    }

    /// Dequeue the oldest batch, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` when the queue stayed empty for the whole timeout.
    /// A zero timeout polls without blocking.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<FrameBatch> {
        let mut g = self.inner.lock().expect("lock poisoned");

        if timeout == Duration::ZERO {
            return g.pop_front();
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(batch) = g.pop_front() {
                return Some(batch);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            let remaining = deadline - now;
            let (ng, _) = self.cv.wait_timeout(g, remaining).expect("lock poisoned");
            g = ng;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("lock poisoned").is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").len()
    }
}

impl Default for SegmentQueue {
    fn default() -> Self {
        Self::new()
    }
}
