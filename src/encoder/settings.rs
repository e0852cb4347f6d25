//! Encoder settings and validation
//!
//! Immutable configuration for a recording session: frame geometry,
//! rates, pixel formats and the destination passed to the sink.

use crate::encoder::types::{EncoderError, EncoderResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw input pixel format accepted from the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgba,
    Bgra,
    Rgb24,
    Bgr24,
}

impl PixelFormat {
    /// Bytes per pixel: 4 for formats carrying alpha, 3 otherwise
    pub fn channels(&self) -> u32 {
        match self {
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
        }
    }

    /// Name understood by FFmpeg's `-pix_fmt`
    pub fn as_ffmpeg(&self) -> &'static str {
        match self {
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
        }
    }
}

/// Settings for an encoder session
///
/// Fixed for the lifetime of a session; validated before `start()` is
/// accepted. Build with [`EncoderSettings::builder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderSettings {
    /// Nominal rate of producer submissions, in frames per second
    pub input_fps: f64,

    /// Target rate of the delivered stream, in frames per second
    pub output_fps: f64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Pixel format of submitted buffers
    pub input_pixel_format: PixelFormat,

    /// Pixel format requested from the encoder (e.g. "yuv420p")
    pub output_pixel_format: String,

    /// Video codec requested from the encoder (e.g. "libx264")
    pub codec: String,

    /// Destination identifier handed to the sink (output file path)
    pub output_path: String,

    /// Extra arguments inserted before the input declaration
    #[serde(default)]
    pub extra_input_args: Vec<String>,

    /// Extra arguments inserted before the output path
    #[serde(default)]
    pub extra_output_args: Vec<String>,

    /// Capacity of the frame handoff queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound on duplicates enqueued by a single catch-up burst
    #[serde(default = "default_max_catchup_frames")]
    pub max_catchup_frames: usize,
}

fn default_queue_capacity() -> usize {
    120
}

fn default_max_catchup_frames() -> usize {
    64
}

impl EncoderSettings {
    pub fn builder() -> EncoderSettingsBuilder {
        EncoderSettingsBuilder::new()
    }

    /// Size in bytes of one submitted frame
    pub fn frame_size(&self) -> usize {
        (self.width * self.height * self.input_pixel_format.channels()) as usize
    }

    /// Target spacing between delivered frames
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.output_fps)
    }

    /// Check the settings before a session may start
    pub fn validate(&self) -> EncoderResult<()> {
        if !(self.input_fps > 0.0 && self.input_fps.is_finite()) {
            return Err(EncoderError::InvalidConfig(format!(
                "input fps must be positive, got {}",
                self.input_fps
            )));
        }
        if !(self.output_fps > 0.0 && self.output_fps.is_finite()) {
            return Err(EncoderError::InvalidConfig(format!(
                "output fps must be positive, got {}",
                self.output_fps
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(EncoderError::InvalidConfig(format!(
                "frame dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.output_path.is_empty() {
            return Err(EncoderError::InvalidConfig(
                "output path is empty".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(EncoderError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.max_catchup_frames == 0 {
            return Err(EncoderError::InvalidConfig(
                "max catch-up frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chained builder for [`EncoderSettings`]
pub struct EncoderSettingsBuilder {
    settings: EncoderSettings,
}

impl EncoderSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: EncoderSettings {
                input_fps: 60.0,
                output_fps: 60.0,
                width: 640,
                height: 480,
                input_pixel_format: PixelFormat::Rgba,
                output_pixel_format: "yuv420p".to_string(),
                codec: "libx264".to_string(),
                output_path: "output.mp4".to_string(),
                extra_input_args: Vec::new(),
                extra_output_args: Vec::new(),
                queue_capacity: default_queue_capacity(),
                max_catchup_frames: default_max_catchup_frames(),
            },
        }
    }

    pub fn input_fps(mut self, fps: f64) -> Self {
        self.settings.input_fps = fps;
        self
    }

    pub fn output_fps(mut self, fps: f64) -> Self {
        self.settings.output_fps = fps;
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.settings.width = width;
        self.settings.height = height;
        self
    }

    pub fn input_pixel_format(mut self, format: PixelFormat) -> Self {
        self.settings.input_pixel_format = format;
        self
    }

    pub fn output_pixel_format(mut self, format: impl Into<String>) -> Self {
        self.settings.output_pixel_format = format.into();
        self
    }

    pub fn codec(mut self, codec: impl Into<String>) -> Self {
        self.settings.codec = codec.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.settings.output_path = path.into();
        self
    }

    pub fn extra_input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.extra_input_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn extra_output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.extra_output_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.queue_capacity = capacity;
        self
    }

    pub fn max_catchup_frames(mut self, frames: usize) -> Self {
        self.settings.max_catchup_frames = frames;
        self
    }

    pub fn build(self) -> EncoderSettings {
        self.settings
    }
}

impl Default for EncoderSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
