//! Camera/file capture through an ffmpeg subprocess emitting raw rgb24 frames.

use crate::config::CameraConfig;
use crate::error::{Result, SeesayError};
use crate::vision::source::FrameSource;
use crate::vision::types::Frame;
use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Interprets `"0"`, `"1"`, ... as a video device index.
pub fn parse_device_index(device: &str) -> Option<u32> {
    let trimmed = device.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Builds the ffmpeg argument list for a capture device or input URI.
pub fn ffmpeg_args(config: &CameraConfig) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let size = format!("{}x{}", config.width, config.height);
    match parse_device_index(&config.device) {
        Some(index) if cfg!(target_os = "macos") => {
            args.extend([
                "-f".to_string(),
                "avfoundation".to_string(),
                "-framerate".to_string(),
                config.fps.to_string(),
                "-video_size".to_string(),
                size,
                "-i".to_string(),
                index.to_string(),
            ]);
        }
        Some(index) => {
            args.extend([
                "-f".to_string(),
                "v4l2".to_string(),
                "-framerate".to_string(),
                config.fps.to_string(),
                "-video_size".to_string(),
                size,
                "-i".to_string(),
                format!("/dev/video{index}"),
            ]);
        }
        None if config.device.starts_with("/dev/video") => {
            args.extend([
                "-f".to_string(),
                "v4l2".to_string(),
                "-framerate".to_string(),
                config.fps.to_string(),
                "-i".to_string(),
                config.device.clone(),
            ]);
        }
        None => {
            args.extend(["-i".to_string(), config.device.clone()]);
        }
    }

    args.extend([
        "-an".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", config.width, config.height),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-".to_string(),
    ]);
    args
}

pub struct FfmpegFrameSource {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    program: String,
    width: u32,
    height: u32,
    sequence: u64,
}

impl FfmpegFrameSource {
    /// Spawn ffmpeg for the configured device.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let args = ffmpeg_args(config);
        tracing::debug!(?args, "starting ffmpeg capture");

        let source = Self::spawn("ffmpeg", &args, config.width, config.height).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SeesayError::FrameSourceOpen {
                    message: "ffmpeg not found. Install ffmpeg:\n\
                        Ubuntu/Debian: sudo apt install ffmpeg\n\
                        macOS: brew install ffmpeg"
                        .to_string(),
                }
            } else {
                SeesayError::FrameSourceOpen {
                    message: format!("failed to start ffmpeg for '{}': {}", config.device, e),
                }
            }
        })?;

        tracing::info!(
            device = %config.device,
            width = config.width,
            height = config.height,
            "camera opened"
        );
        Ok(source)
    }

    /// Read `width`x`height` rgb24 frames from the stdout of any command.
    pub fn spawn(program: &str, args: &[String], width: u32, height: u32) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other(format!("failed to capture {} stdout", program)))?;

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            program: program.to_string(),
            width,
            height,
            sequence: 0,
        })
    }

    /// Stream closed on a frame boundary: a clean end only if the process
    /// exited successfully.
    fn finish(&mut self) -> Result<Option<Frame>> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };
        let status = child.wait().map_err(|e| SeesayError::FrameRead {
            message: format!("failed to wait for {}: {}", self.program, e),
        })?;
        if status.success() {
            tracing::debug!(frames = self.sequence, "{} stream ended", self.program);
            Ok(None)
        } else if self.sequence == 0 {
            Err(SeesayError::FrameRead {
                message: format!("could not open camera ({} exited with {})", self.program, status),
            })
        } else {
            Err(SeesayError::FrameRead {
                message: format!("{} exited with {} after {} frames", self.program, status, self.sequence),
            })
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; Frame::byte_len(self.width, self.height)];
        let mut filled = 0;
        while filled < data.len() {
            match stdout.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SeesayError::FrameRead {
                        message: format!("{} stream: {}", self.program, e),
                    });
                }
            }
        }

        if filled == data.len() {
            self.sequence += 1;
            return Ok(Some(Frame::new(data, self.width, self.height, self.sequence)));
        }
        if filled > 0 {
            self.release();
            return Err(SeesayError::FrameRead {
                message: format!(
                    "{} stream truncated: {} of {} bytes in frame {}",
                    self.program,
                    filled,
                    data.len(),
                    self.sequence + 1
                ),
            });
        }
        self.finish()
    }

    fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("{} already exited: {}", self.program, e);
            }
            if let Err(e) = child.wait() {
                tracing::warn!("failed to reap {}: {}", self.program, e);
            }
        }
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}
