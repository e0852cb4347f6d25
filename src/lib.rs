//! framepipe - paced delivery of raw pixel frames to an external video
//! encoder.
//!
//! A host application submits raw pixel buffers at whatever cadence it
//! manages to produce them; the pipeline snapshots each buffer, repeats
//! frames as needed so the delivered count tracks the configured output
//! rate, and forwards the result to an encoding sink (typically an
//! FFmpeg child process fed over stdin).
//!
//! ```no_run
//! use framepipe::{EncoderSession, EncoderSettings, PixelFormat};
//!
//! let settings = EncoderSettings::builder()
//!     .resolution(1280, 720)
//!     .output_fps(30.0)
//!     .input_pixel_format(PixelFormat::Rgba)
//!     .output_path("capture.mp4")
//!     .build();
//!
//! let mut session = EncoderSession::with_ffmpeg(settings);
//! session.start()?;
//! let frame = vec![0u8; 1280 * 720 * 4];
//! session.submit_frame(&frame)?;
//! session.stop();
//! session.close(); // waits for the queue to drain, then closes the sink
//! # Ok::<(), framepipe::EncoderError>(())
//! ```

pub mod encoder;
pub mod sink;

pub use encoder::{
    EncoderError, EncoderResult, EncoderSession, EncoderSettings, EncoderSettingsBuilder, Frame,
    PixelFormat, SessionState, SessionStats,
};
pub use sink::{FfmpegSink, MemorySink, Sink, SinkError, SinkResult};
