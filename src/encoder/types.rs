//! Encoder types and error handling
//!
//! This module defines the frame snapshot, the session state machine
//! and the error taxonomy shared by the encoding pipeline.

use crate::sink::SinkError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// An immutable snapshot of raw pixel bytes taken at submission time.
///
/// The snapshot is reference-counted so the producer and the delivery
/// worker share the same allocation; cloning a `Frame` never copies
/// pixel data. The producer may reuse its own buffer as soon as
/// `submit_frame` returns.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<[u8]>,
}

impl Frame {
    /// Snapshot the given pixel buffer.
    pub fn copy_from(pixels: &[u8]) -> Self {
        Self {
            data: Arc::from(pixels),
        }
    }

    /// Raw frame bytes, row-major, in the configured channel order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes (`width * height * channels` for the session).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Current state of an encoder session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Never started
    Idle,
    /// Accepting frames
    Recording,
    /// Stopped, but queued frames are still being delivered
    Draining,
    /// Fully drained; a new session may start
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Snapshot of session counters for progress reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Current state
    pub state: SessionState,

    /// Frames enqueued by the pacer (submissions plus duplicates)
    pub frames_enqueued: u64,

    /// Frames successfully written to the sink
    pub frames_written: u64,

    /// Write attempts that failed or were short
    pub write_failures: u64,

    /// Frames currently waiting in the queue
    pub queue_depth: usize,

    /// Output-timeline duration covered so far, in seconds
    pub recorded_duration_secs: f64,

    /// Wall-clock time the session started
    pub started_at: Option<DateTime<Utc>>,
}

/// Encoder errors
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    #[error("recording already in progress")]
    AlreadyRecording,

    #[error("previous session is still draining")]
    NotReady,

    #[error("recording not started")]
    NotRecording,

    #[error("frame size mismatch: got {got} bytes, expected {expected}")]
    FrameSize { got: usize, expected: usize },

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Result type alias using EncoderError
pub type EncoderResult<T> = Result<T, EncoderError>;
