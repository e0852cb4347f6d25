//! FFmpeg pipe sink
//!
//! Spawns an `ffmpeg` child process configured for rawvideo input on
//! stdin and streams delivered frames into it. The child owns all pixel
//! transformation: color-space conversion, scaling and compression
//! happen behind the pipe.

use crate::encoder::settings::EncoderSettings;
use crate::sink::{Sink, SinkError, SinkResult};
use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Sink writing raw frames to an FFmpeg encoding process.
pub struct FfmpegSink {
    args: Vec<String>,
    process: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    /// Build a sink for the given settings. The process is not spawned
    /// until [`Sink::open`] is called.
    pub fn new(settings: &EncoderSettings) -> Self {
        Self {
            args: build_args(settings),
            process: None,
            stdin: None,
        }
    }

    /// The argument vector the spawned process will receive.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Sink for FfmpegSink {
    fn open(&mut self) -> SinkResult<()> {
        if self.stdin.is_some() {
            return Err(SinkError::AlreadyOpen);
        }

        tracing::info!("Starting FFmpeg encoder: {:?}", self.args);

        let mut process = Command::new("ffmpeg")
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SinkError::Spawn(format!("failed to start ffmpeg: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SinkError::Spawn("failed to capture ffmpeg stdin".to_string()))?;

        self.process = Some(process);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn write(&mut self, frame: &[u8]) -> SinkResult<usize> {
        let stdin = self.stdin.as_mut().ok_or(SinkError::NotOpen)?;
        stdin.write_all(frame)?;
        Ok(frame.len())
    }

    fn close(&mut self) -> SinkResult<()> {
        // Dropping stdin signals EOF so FFmpeg finalizes the output.
        drop(self.stdin.take());

        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        let status = process.wait().map_err(SinkError::Io)?;
        if !status.success() {
            return Err(SinkError::ProcessFailed(status.to_string()));
        }

        tracing::info!("FFmpeg encoder finished");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stdin.is_some()
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.process.is_some() {
            if let Err(e) = self.close() {
                tracing::warn!("Error closing FFmpeg sink: {}", e);
            }
        }
    }
}

/// Assemble the FFmpeg argument vector for a rawvideo stdin pipe.
fn build_args(settings: &EncoderSettings) -> Vec<String> {
    let mut args = vec![
        // Overwrite the destination, no audio track.
        "-y".to_string(),
        "-an".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        settings.input_pixel_format.as_ffmpeg().to_string(),
        "-s".to_string(),
        format!("{}x{}", settings.width, settings.height),
        "-framerate".to_string(),
        settings.input_fps.to_string(),
    ];

    args.extend(settings.extra_input_args.iter().cloned());

    args.extend([
        "-i".to_string(),
        "-".to_string(), // stdin for video frames
        "-c:v".to_string(),
        settings.codec.clone(),
        "-r".to_string(),
        settings.output_fps.to_string(),
        "-pix_fmt".to_string(),
        settings.output_pixel_format.clone(),
    ]);

    args.extend(settings.extra_output_args.iter().cloned());
    args.push(settings.output_path.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::settings::PixelFormat;

    fn joined(args: &[String]) -> String {
        args.join(" ")
    }

    #[test]
    fn args_describe_rawvideo_stdin_input() {
        let settings = EncoderSettings::builder()
            .resolution(1920, 1080)
            .input_fps(60.0)
            .output_fps(30.0)
            .input_pixel_format(PixelFormat::Bgra)
            .output_path("capture.mp4")
            .build();
        let sink = FfmpegSink::new(&settings);
        let args = joined(sink.args());

        assert!(args.contains("-f rawvideo"));
        assert!(args.contains("-pix_fmt bgra"));
        assert!(args.contains("-s 1920x1080"));
        assert!(args.contains("-framerate 60"));
        assert!(args.contains("-i -"));
        assert!(args.contains("-c:v libx264"));
        assert!(args.contains("-r 30"));
        assert!(args.ends_with("capture.mp4"));
    }

    #[test]
    fn extra_args_are_spliced_around_the_input() {
        let settings = EncoderSettings::builder()
            .extra_input_args(["-hwaccel", "auto"])
            .extra_output_args(["-crf", "18"])
            .build();
        let sink = FfmpegSink::new(&settings);
        let args = joined(sink.args());

        assert!(args.contains("-hwaccel auto -i -"));
        assert!(args.contains("-crf 18 output.mp4"));
    }

    #[test]
    fn write_before_open_fails() {
        let settings = EncoderSettings::builder().build();
        let mut sink = FfmpegSink::new(&settings);
        assert!(!sink.is_open());
        assert!(matches!(sink.write(&[0u8; 4]), Err(SinkError::NotOpen)));
    }

    #[test]
    fn close_before_open_is_a_noop() {
        let settings = EncoderSettings::builder().build();
        let mut sink = FfmpegSink::new(&settings);
        assert!(sink.close().is_ok());
    }
}
