//! Frame sinks
//!
//! A sink is the external destination consuming raw frame bytes, e.g.
//! an encoding process. The pipeline is sink-agnostic: anything with an
//! open/write/close lifecycle can receive the paced stream, which lets
//! tests substitute an in-memory sink for a real encoder.

pub mod ffmpeg;
pub mod memory;

pub use ffmpeg::FfmpegSink;
pub use memory::MemorySink;

use thiserror::Error;

/// Sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start encoder process: {0}")]
    Spawn(String),

    #[error("sink is not open")]
    NotOpen,

    #[error("sink is already open")]
    AlreadyOpen,

    #[error("encoder process exited with an error: {0}")]
    ProcessFailed(String),
}

/// Result type alias using SinkError
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for delivered frames.
///
/// Exactly one thread writes to a sink at a time. `write` receives
/// exactly `width * height * channels` bytes per frame, row-major, in
/// the configured channel order, and returns the number of bytes
/// accepted; a short count is treated as a failed frame by the caller.
pub trait Sink: Send {
    /// Open the destination. Called once per session by `start()`.
    fn open(&mut self) -> SinkResult<()>;

    /// Deliver one frame, returning the number of bytes written.
    fn write(&mut self, frame: &[u8]) -> SinkResult<usize>;

    /// Close the destination, flushing anything in flight.
    fn close(&mut self) -> SinkResult<()>;

    /// Whether the sink is currently open for writing.
    fn is_open(&self) -> bool;
}
