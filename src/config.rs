use crate::defaults;
use crate::error::{Result, SeesayError};
use crate::pipeline::{AnnouncerConfig, PipelineConfig};
use crate::speech::SpeechBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub stability: StabilityConfig,
    pub announce: AnnounceConfig,
    pub speech: SpeechConfig,
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Candidate filtering and frame sampling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    /// Run detection on every Nth frame.
    pub skip_interval: u64,
}

/// Temporal stabilization of detections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StabilityConfig {
    /// Consecutive processed frames a label must appear in.
    pub window: usize,
    /// Whether frames with no detections count toward the window.
    pub push_empty: bool,
}

/// Announcement queue and text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnounceConfig {
    pub queue_capacity: usize,
    pub max_objects: usize,
    pub prefix: String,
    pub suppress_repeats: bool,
    pub wait_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
}

/// Speech synthesizer selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,
    pub timeout_ms: u64,
    /// Backend-specific speaking rate; the backend default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<i32>,
}

/// Capture device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (`"0"`), device path, file or URL.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Detection model process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: String,
    pub args: Vec<String>,
    pub labels_path: PathBuf,
    pub input_size: u32,
}

/// Terminal output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub fps_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (`error`..`trace`).
    pub level: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            nms_threshold: defaults::NMS_THRESHOLD,
            skip_interval: defaults::SKIP_INTERVAL,
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window: defaults::STABILITY_WINDOW,
            push_empty: true,
        }
    }
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::QUEUE_CAPACITY,
            max_objects: defaults::MAX_ANNOUNCED_OBJECTS,
            prefix: defaults::ANNOUNCE_PREFIX.to_string(),
            suppress_repeats: false,
            wait_timeout_ms: defaults::WAIT_TIMEOUT_MS,
            shutdown_timeout_ms: defaults::SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::Auto,
            timeout_ms: defaults::SPEAK_TIMEOUT_MS,
            rate: None,
        }
    }
}

impl SpeechConfig {
    /// Upper bound on one utterance.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: defaults::CAMERA_DEVICE.to_string(),
            width: defaults::CAMERA_WIDTH,
            height: defaults::CAMERA_HEIGHT,
            fps: defaults::CAMERA_FPS,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: defaults::DETECTOR_COMMAND.to_string(),
            args: Vec::new(),
            labels_path: PathBuf::from(defaults::LABELS_PATH),
            input_size: defaults::DETECTOR_INPUT_SIZE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fps_window: defaults::FPS_WINDOW,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

fn invalid(key: &str, message: &str) -> SeesayError {
    SeesayError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn non_zero_usize(value: usize, key: &str) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value).ok_or_else(|| invalid(key, "must be at least 1"))
}

fn unit_interval(value: f32, key: &str) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(key, &format!("{} is outside 0.0..=1.0", value)))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SEESAY_CAMERA → camera.device
    /// - SEESAY_SPEECH_BACKEND → speech.backend
    /// - SEESAY_DETECTOR → detector.command
    /// - SEESAY_LOG_LEVEL → logging.level
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(device) = std::env::var("SEESAY_CAMERA")
            && !device.is_empty()
        {
            self.camera.device = device;
        }

        if let Ok(backend) = std::env::var("SEESAY_SPEECH_BACKEND")
            && !backend.is_empty()
        {
            self.speech.backend = backend.parse()?;
        }

        if let Ok(command) = std::env::var("SEESAY_DETECTOR")
            && !command.is_empty()
        {
            self.detector.command = command;
        }

        if let Ok(level) = std::env::var("SEESAY_LOG_LEVEL")
            && !level.is_empty()
        {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// `~/.config/seesay/config.toml` on Linux; `None` when the platform has
    /// no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("seesay").join("config.toml"))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        unit_interval(
            self.detection.confidence_threshold,
            "detection.confidence_threshold",
        )?;
        unit_interval(self.detection.nms_threshold, "detection.nms_threshold")?;
        if self.detection.skip_interval == 0 {
            return Err(invalid("detection.skip_interval", "must be at least 1"));
        }
        non_zero_usize(self.stability.window, "stability.window")?;
        non_zero_usize(self.announce.queue_capacity, "announce.queue_capacity")?;
        non_zero_usize(self.announce.max_objects, "announce.max_objects")?;
        non_zero_usize(self.display.fps_window, "display.fps_window")?;
        if self.announce.wait_timeout_ms == 0 {
            return Err(invalid("announce.wait_timeout_ms", "must be positive"));
        }
        if self.announce.shutdown_timeout_ms == 0 {
            return Err(invalid("announce.shutdown_timeout_ms", "must be positive"));
        }
        if self.speech.timeout_ms == 0 {
            return Err(invalid("speech.timeout_ms", "must be positive"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(invalid("camera", "width and height must be positive"));
        }
        if self.camera.device.trim().is_empty() {
            return Err(invalid("camera.device", "must not be empty"));
        }
        Ok(())
    }

    /// Resolve the immutable pipeline settings. Validates first.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        self.validate()?;
        Ok(PipelineConfig {
            confidence_threshold: self.detection.confidence_threshold,
            nms_threshold: self.detection.nms_threshold,
            skip_interval: NonZeroU64::new(self.detection.skip_interval)
                .ok_or_else(|| invalid("detection.skip_interval", "must be at least 1"))?,
            window: non_zero_usize(self.stability.window, "stability.window")?,
            push_empty: self.stability.push_empty,
            max_objects: non_zero_usize(self.announce.max_objects, "announce.max_objects")?,
            prefix: self.announce.prefix.clone(),
            suppress_repeats: self.announce.suppress_repeats,
            announcer: AnnouncerConfig {
                capacity: non_zero_usize(self.announce.queue_capacity, "announce.queue_capacity")?,
                wait_timeout: Duration::from_millis(self.announce.wait_timeout_ms),
                shutdown_timeout: Duration::from_millis(self.announce.shutdown_timeout_ms),
            },
            fps_window: non_zero_usize(self.display.fps_window, "display.fps_window")?,
            max_frames: None,
        })
    }

    /// Render as TOML (for `config show` / `config init`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SeesayError::ConfigParse {
            message: e.to_string(),
        })
    }
}
