//! Frame handoff queue
//!
//! Bounded FIFO buffer between the producer thread and the delivery
//! worker. Exactly one thread produces and exactly one consumes; the
//! queue itself needs no external locking by callers.

use crate::encoder::types::Frame;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Fixed-capacity single-producer single-consumer frame queue.
///
/// `produce` applies backpressure by blocking while the queue is full;
/// `consume` blocks while it is empty. The paced worker loop uses
/// [`FrameQueue::try_consume`] so the wait between deliveries stays
/// under its own control.
pub struct FrameQueue {
    inner: Mutex<VecDeque<Frame>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Insert a frame at the tail, blocking while the queue is full.
    pub fn produce(&self, frame: Frame) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            self.not_full.wait(&mut queue);
        }
        queue.push_back(frame);
        self.not_empty.notify_one();
    }

    /// Remove the frame at the head, blocking while the queue is empty.
    pub fn consume(&self) -> Frame {
        let mut queue = self.inner.lock();
        loop {
            if let Some(frame) = queue.pop_front() {
                self.not_full.notify_one();
                return frame;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    /// Remove the frame at the head if one is present.
    pub fn try_consume(&self) -> Option<Frame> {
        let mut queue = self.inner.lock();
        let frame = queue.pop_front();
        if frame.is_some() {
            self.not_full.notify_one();
        }
        frame
    }

    /// Current occupancy.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
