//! Frame pacing
//!
//! Decides how many copies of a submitted frame must be enqueued so the
//! delivered stream tracks `elapsed * output_fps`, independent of the
//! producer's actual call cadence.

use std::time::Instant;

/// Producer-side pacing state for one session.
///
/// The pacer only advances when `submit_frame` is called; there is no
/// background ticking. A producer running slower than the output rate
/// gets its latest frame duplicated to fill the gap; a producer running
/// faster gets zero-enqueue calls until the next output slot comes due.
pub struct FramePacer {
    output_fps: f64,
    max_burst: usize,
    session_start: Option<Instant>,
    frames_enqueued: u64,
}

impl FramePacer {
    /// `max_burst` caps the duplicates a single catch-up call may
    /// enqueue, bounding the queue growth after a long producer stall.
    pub fn new(output_fps: f64, max_burst: usize) -> Self {
        Self {
            output_fps,
            max_burst,
            session_start: None,
            frames_enqueued: 0,
        }
    }

    /// Forget the session start and all counters.
    pub fn reset(&mut self) {
        self.session_start = None;
        self.frames_enqueued = 0;
    }

    /// Frames enqueued so far, duplicates included.
    pub fn frames_enqueued(&self) -> u64 {
        self.frames_enqueued
    }

    /// Duration covered on the output timeline, in seconds.
    pub fn recorded_duration(&self) -> f64 {
        self.frames_enqueued as f64 / self.output_fps
    }

    /// Number of copies of the current frame to enqueue for a
    /// submission arriving at `now`.
    ///
    /// The first call of a session records the session start and is
    /// always worth exactly one frame. Later calls are worth one frame
    /// per output slot that has come due since the recorded duration,
    /// which may be zero when the producer outpaces the output rate.
    pub fn due_count(&mut self, now: Instant) -> usize {
        let start = match self.session_start {
            Some(start) => start,
            None => {
                self.session_start = Some(now);
                self.frames_enqueued = 1;
                return 1;
            }
        };

        let elapsed = now.duration_since(start).as_secs_f64();
        let delta = elapsed - self.recorded_duration();
        let due = (delta * self.output_fps).floor().max(0.0) as usize;

        let count = if due > self.max_burst {
            tracing::warn!(
                "Catch-up burst of {} frames clamped to {}; delivered timeline will lag real time",
                due,
                self.max_burst
            );
            self.max_burst
        } else {
            due
        };

        self.frames_enqueued += count as u64;
        count
    }
}
