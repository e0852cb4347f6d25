//! Encoder session
//!
//! Orchestrates the recording lifecycle: owns the frame queue, the
//! pacer, the sink and the delivery worker, and exposes the
//! start / stop / submit-frame surface to the host application.

use crate::encoder::pacer::FramePacer;
use crate::encoder::queue::FrameQueue;
use crate::encoder::settings::EncoderSettings;
use crate::encoder::types::{EncoderError, EncoderResult, Frame, SessionState, SessionStats};
use crate::encoder::worker;
use crate::sink::ffmpeg::FfmpegSink;
use crate::sink::{Sink, SinkError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// State shared between the producer thread and the delivery worker.
///
/// The queue is the only structure both threads mutate; everything else
/// is an atomic counter or the sink guarded by its own lock.
pub(crate) struct SessionShared {
    pub(crate) queue: FrameQueue,
    pub(crate) recording: AtomicBool,
    pub(crate) worker_active: AtomicBool,
    pub(crate) sink_open: AtomicBool,
    pub(crate) frames_written: AtomicU64,
    pub(crate) write_failures: AtomicU64,
    pub(crate) sink: Mutex<Box<dyn Sink + Send>>,
}

/// A recording session feeding raw frames to an encoding sink at a
/// fixed output rate.
///
/// State machine: Idle → `start()` → Recording → `stop()` → Draining →
/// (queue empty, worker exited) → Stopped → `start()` → Recording.
/// At most one session should be recording per sink at a time;
/// [`EncoderSession::is_ready`] reports whether a new session may start.
pub struct EncoderSession {
    settings: EncoderSettings,
    shared: Arc<SessionShared>,
    pacer: FramePacer,
    worker: Option<JoinHandle<()>>,
    started_once: bool,
    started_at: Option<DateTime<Utc>>,
    frame_size: usize,
}

impl EncoderSession {
    /// Create a session writing to the given sink.
    pub fn new(settings: EncoderSettings, sink: Box<dyn Sink + Send>) -> Self {
        let frame_size = settings.frame_size();
        let pacer = FramePacer::new(settings.output_fps, settings.max_catchup_frames);
        let shared = Arc::new(SessionShared {
            queue: FrameQueue::new(settings.queue_capacity),
            recording: AtomicBool::new(false),
            worker_active: AtomicBool::new(false),
            sink_open: AtomicBool::new(false),
            frames_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            sink: Mutex::new(sink),
        });
        Self {
            settings,
            shared,
            pacer,
            worker: None,
            started_once: false,
            started_at: None,
            frame_size,
        }
    }

    /// Create a session piping frames to an FFmpeg child process.
    pub fn with_ffmpeg(settings: EncoderSettings) -> Self {
        let sink = FfmpegSink::new(&settings);
        Self::new(settings, Box::new(sink))
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Start recording.
    ///
    /// Fails without a state change if a recording is already in
    /// progress, if the previous session has not finished draining, or
    /// if the settings do not validate. Opens the sink; an open failure
    /// leaves the session idle.
    pub fn start(&mut self) -> EncoderResult<()> {
        if self.shared.recording.load(Ordering::Acquire) {
            return Err(EncoderError::AlreadyRecording);
        }
        if !self.is_ready() {
            return Err(EncoderError::NotReady);
        }
        self.settings.validate()?;

        // The previous worker has exited by now; reap its handle so a
        // fresh one can be spawned on the first submission.
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Previous delivery worker panicked");
            }
        }

        self.pacer.reset();
        self.shared.frames_written.store(0, Ordering::Relaxed);
        self.shared.write_failures.store(0, Ordering::Relaxed);

        {
            let mut sink = self.shared.sink.lock();
            // A session stopped before its first frame leaves the sink
            // open, since only the worker closes it mid-lifecycle.
            if sink.is_open() {
                if let Err(e) = sink.close() {
                    tracing::warn!("Error closing sink left over from previous session: {}", e);
                }
            }
            sink.open()?;
        }
        self.shared.sink_open.store(true, Ordering::Release);

        self.started_at = Some(Utc::now());
        self.started_once = true;
        self.shared.recording.store(true, Ordering::Release);
        tracing::info!(
            "Recording started: {}x{} @ {} fps to {}",
            self.settings.width,
            self.settings.height,
            self.settings.output_fps,
            self.settings.output_path
        );
        Ok(())
    }

    /// Stop accepting frames.
    ///
    /// Idempotent and asynchronous: queued frames keep draining to the
    /// sink at the output rate, and the sink closes once the worker
    /// exits. Poll [`EncoderSession::is_ready`] to learn when a new
    /// session may start.
    pub fn stop(&mut self) {
        if self.shared.recording.swap(false, Ordering::AcqRel) {
            tracing::info!(
                "Recording stopping; {} frames queued for delivery",
                self.shared.queue.len()
            );
        }
    }

    /// Submit the next captured frame.
    ///
    /// Snapshots the buffer, asks the pacer how many output slots have
    /// come due and enqueues that many references to the snapshot.
    /// Returns the number enqueued; zero means the producer is running
    /// ahead of the output rate and this call was a no-op.
    pub fn submit_frame(&mut self, pixels: &[u8]) -> EncoderResult<usize> {
        if !self.shared.recording.load(Ordering::Acquire) {
            return Err(EncoderError::NotRecording);
        }
        // Checked via the flag rather than the sink lock so a slow
        // sink write by the worker cannot stall the producer; the
        // producer only ever blocks on a full queue.
        if !self.shared.sink_open.load(Ordering::Acquire) {
            return Err(EncoderError::Sink(SinkError::NotOpen));
        }
        if pixels.len() != self.frame_size {
            return Err(EncoderError::FrameSize {
                got: pixels.len(),
                expected: self.frame_size,
            });
        }

        if self.worker.is_none() {
            self.spawn_worker()?;
        }

        let count = self.pacer.due_count(Instant::now());
        if count > 0 {
            let frame = Frame::copy_from(pixels);
            for _ in 1..count {
                self.shared.queue.produce(frame.clone());
            }
            self.shared.queue.produce(frame);
        }
        Ok(count)
    }

    fn spawn_worker(&mut self) -> EncoderResult<()> {
        let shared = Arc::clone(&self.shared);
        let frame_period = self.settings.frame_period();
        self.shared.worker_active.store(true, Ordering::Release);
        match std::thread::Builder::new()
            .name("frame-delivery".to_string())
            .spawn(move || worker::run(&shared, frame_period))
        {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.worker_active.store(false, Ordering::Release);
                Err(EncoderError::Io(e))
            }
        }
    }

    /// True iff a new session may start: not recording, the queue is
    /// drained and the previous delivery worker has exited.
    pub fn is_ready(&self) -> bool {
        !self.shared.recording.load(Ordering::Acquire)
            && self.shared.queue.is_empty()
            && !self.shared.worker_active.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.shared.recording.load(Ordering::Acquire) {
            SessionState::Recording
        } else if self.shared.worker_active.load(Ordering::Acquire)
            || !self.shared.queue.is_empty()
        {
            SessionState::Draining
        } else if self.started_once {
            SessionState::Stopped
        } else {
            SessionState::Idle
        }
    }

    /// Frames successfully delivered to the sink.
    pub fn frames_written(&self) -> u64 {
        self.shared.frames_written.load(Ordering::Relaxed)
    }

    /// Duration covered on the output timeline, in seconds.
    pub fn recorded_duration(&self) -> f64 {
        self.pacer.recorded_duration()
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state(),
            frames_enqueued: self.pacer.frames_enqueued(),
            frames_written: self.frames_written(),
            write_failures: self.shared.write_failures.load(Ordering::Relaxed),
            queue_depth: self.shared.queue.len(),
            recorded_duration_secs: self.pacer.recorded_duration(),
            started_at: self.started_at,
        }
    }

    /// Tear the session down: stop recording, wait for the worker to
    /// drain and deliver every queued frame, then close the sink.
    pub fn close(&mut self) {
        self.stop();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Delivery worker panicked during teardown");
            }
        }
        // The worker closes the sink on exit; this covers sessions
        // that stopped before a single frame was submitted.
        let mut sink = self.shared.sink.lock();
        if sink.is_open() {
            if let Err(e) = sink.close() {
                tracing::warn!("Error closing sink during teardown: {}", e);
            }
        }
        self.shared.sink_open.store(false, Ordering::Release);
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;

    fn test_settings() -> EncoderSettings {
        EncoderSettings::builder()
            .resolution(4, 2)
            .output_fps(30.0)
            .output_path("test.mp4")
            .build()
    }

    fn test_session() -> EncoderSession {
        EncoderSession::new(test_settings(), Box::new(MemorySink::new()))
    }

    #[test]
    fn new_session_is_idle_and_ready() {
        let session = test_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.is_ready());
        assert_eq!(session.frames_written(), 0);
    }

    #[test]
    fn start_twice_fails_without_state_change() {
        let mut session = test_session();
        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(EncoderError::AlreadyRecording)
        ));
        assert_eq!(session.state(), SessionState::Recording);
    }

    #[test]
    fn submit_before_start_is_rejected() {
        let mut session = test_session();
        let pixels = vec![0u8; session.settings().frame_size()];
        assert!(matches!(
            session.submit_frame(&pixels),
            Err(EncoderError::NotRecording)
        ));
    }

    #[test]
    fn submit_after_stop_is_rejected() {
        let mut session = test_session();
        session.start().unwrap();
        session.stop();
        let pixels = vec![0u8; session.settings().frame_size()];
        assert!(matches!(
            session.submit_frame(&pixels),
            Err(EncoderError::NotRecording)
        ));
    }

    #[test]
    fn submit_with_wrong_frame_size_is_rejected() {
        let mut session = test_session();
        session.start().unwrap();
        let expected = session.settings().frame_size();
        match session.submit_frame(&[0u8; 3]) {
            Err(EncoderError::FrameSize { got, expected: e }) => {
                assert_eq!(got, 3);
                assert_eq!(e, expected);
            }
            other => panic!("expected frame size error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_settings_are_rejected_at_start() {
        let settings = EncoderSettings::builder().output_path("").build();
        let mut session = EncoderSession::new(settings, Box::new(MemorySink::new()));
        assert!(matches!(
            session.start(),
            Err(EncoderError::InvalidConfig(_))
        ));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn sink_open_failure_leaves_session_idle() {
        let sink = MemorySink::new().with_open_failure();
        let mut session = EncoderSession::new(test_settings(), Box::new(sink));
        assert!(matches!(session.start(), Err(EncoderError::Sink(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.is_ready());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut session = test_session();
        session.start().unwrap();
        session.stop();
        session.stop();
        assert_ne!(session.state(), SessionState::Recording);
    }

    #[test]
    fn stop_without_frames_is_immediately_ready() {
        let mut session = test_session();
        session.start().unwrap();
        session.stop();
        // No frame was submitted, so no worker exists and nothing is
        // queued.
        assert!(session.is_ready());
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn restart_after_zero_frame_session_reopens_the_sink() {
        let mut session = test_session();
        session.start().unwrap();
        session.stop();
        // No frame was submitted, so no worker ever ran and the sink
        // is still open from start().
        assert!(session.is_ready());
        assert_eq!(session.state(), SessionState::Stopped);

        session
            .start()
            .expect("restart after a zero-frame session must succeed");
        assert_eq!(session.state(), SessionState::Recording);
        let pixels = vec![0u8; session.settings().frame_size()];
        session.submit_frame(&pixels).unwrap();
    }

    #[test]
    fn start_resets_counters() {
        let sink = MemorySink::new();
        let mut session = EncoderSession::new(test_settings(), Box::new(sink));
        session.start().unwrap();
        let pixels = vec![0u8; session.settings().frame_size()];
        session.submit_frame(&pixels).unwrap();
        session.stop();
        session.close();

        session.start().unwrap();
        let stats = session.stats();
        assert_eq!(stats.frames_enqueued, 0);
        assert_eq!(stats.frames_written, 0);
        assert_eq!(stats.recorded_duration_secs, 0.0);
    }
}
