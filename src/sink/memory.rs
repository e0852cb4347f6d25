//! In-memory sink
//!
//! Captures delivered frames in a shared buffer instead of piping them
//! to an external process. Used by the test suite and handy for
//! headless verification of the pacing pipeline.

use crate::sink::{Sink, SinkError, SinkResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink collecting every delivered frame in memory.
#[derive(Default)]
pub struct MemorySink {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    open: bool,
    fail_open: bool,
    fail_writes: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `open()` call fail, for error-path tests.
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make every `write()` call fail, for error-path tests.
    pub fn with_write_failure(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Shared handle to the captured frames, valid after the sink has
    /// been handed to a session.
    pub fn frames(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.frames)
    }
}

impl Sink for MemorySink {
    fn open(&mut self) -> SinkResult<()> {
        if self.fail_open {
            return Err(SinkError::Spawn("memory sink told to fail".to_string()));
        }
        if self.open {
            return Err(SinkError::AlreadyOpen);
        }
        self.open = true;
        Ok(())
    }

    fn write(&mut self, frame: &[u8]) -> SinkResult<usize> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        if self.fail_writes {
            return Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "memory sink told to fail",
            )));
        }
        self.frames.lock().push(frame.to_vec());
        Ok(frame.len())
    }

    fn close(&mut self) -> SinkResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_written_frames() {
        let mut sink = MemorySink::new();
        let frames = sink.frames();
        sink.open().unwrap();
        assert_eq!(sink.write(&[1, 2]).unwrap(), 2);
        assert_eq!(sink.write(&[3, 4]).unwrap(), 2);
        sink.close().unwrap();
        assert_eq!(*frames.lock(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn write_requires_open() {
        let mut sink = MemorySink::new();
        assert!(matches!(sink.write(&[0]), Err(SinkError::NotOpen)));
    }

    #[test]
    fn close_is_idempotent() {
        let mut sink = MemorySink::new();
        sink.open().unwrap();
        assert!(sink.close().is_ok());
        assert!(sink.close().is_ok());
        assert!(!sink.is_open());
    }

    #[test]
    fn can_reopen_after_close() {
        let mut sink = MemorySink::new();
        sink.open().unwrap();
        sink.close().unwrap();
        assert!(sink.open().is_ok());
        assert!(sink.is_open());
    }

    #[test]
    fn injected_write_failure_surfaces() {
        let mut sink = MemorySink::new().with_write_failure();
        sink.open().unwrap();
        assert!(matches!(sink.write(&[0]), Err(SinkError::Io(_))));
    }
}
