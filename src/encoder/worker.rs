//! Delivery worker
//!
//! Background loop that drains the frame queue at the configured output
//! rate and forwards each frame to the sink. Spawned lazily on the
//! first submission of a session; exits only once recording has stopped
//! and every queued frame has been delivered.

use crate::encoder::session::SessionShared;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Poll interval while waiting for the next output slot or for the
/// producer to enqueue more frames.
const POLL_INTERVAL: Duration = Duration::from_micros(500);

/// Run the delivery loop until recording stops and the queue is empty.
///
/// A failed or short write is reported and counted but never fatal;
/// the loop moves on to the next frame so a transient sink fault cannot
/// stall the recording. The sink is closed on the way out, whatever the
/// delivery outcome.
pub(crate) fn run(shared: &SessionShared, frame_period: Duration) {
    let mut last_write = Instant::now();
    let mut drain_logged = false;

    loop {
        let recording = shared.recording.load(Ordering::Acquire);

        if shared.queue.is_empty() {
            if !recording {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }

        if !recording && !drain_logged {
            tracing::info!(
                "Recording stopped; draining {} remaining frames at the output rate",
                shared.queue.len()
            );
            drain_logged = true;
        }

        // Throttle so a burst of enqueued duplicates is not flushed to
        // the sink instantaneously.
        if last_write.elapsed() < frame_period {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }

        if let Some(frame) = shared.queue.try_consume() {
            last_write = Instant::now();
            let expected = frame.len();
            match shared.sink.lock().write(frame.as_bytes()) {
                Ok(written) if written == expected => {
                    shared.frames_written.fetch_add(1, Ordering::Relaxed);
                }
                Ok(written) => {
                    shared.write_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Short frame write: {} of {} bytes", written, expected);
                }
                Err(e) => {
                    shared.write_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Unable to write frame: {}", e);
                }
            }
        }
    }

    if let Err(e) = shared.sink.lock().close() {
        tracing::warn!("Error closing sink after drain: {}", e);
    }
    shared.sink_open.store(false, Ordering::Release);

    let written = shared.frames_written.load(Ordering::Relaxed);
    let failures = shared.write_failures.load(Ordering::Relaxed);
    if failures > 0 {
        tracing::warn!(
            "Delivery finished with failures: {} frames written, {} failed",
            written,
            failures
        );
    } else {
        tracing::debug!("Delivery worker exited: {} frames written", written);
    }
    shared.worker_active.store(false, Ordering::Release);
}
