//! Default configuration constants for seesay.
//!
//! Shared by the TOML config, the resolved pipeline config and the CLI so the
//! three never drift apart.

/// Minimum detector confidence for a candidate box to be kept.
///
/// Strictly greater-than comparison. 0.6 trades a little recall for far fewer
/// flickering false positives on a live camera.
pub const CONFIDENCE_THRESHOLD: f32 = 0.6;

/// IoU above which a lower-confidence box is suppressed by NMS.
pub const NMS_THRESHOLD: f32 = 0.4;

/// Run detection on every Nth frame.
pub const SKIP_INTERVAL: u64 = 3;

/// Number of consecutive processed frames a label must appear in.
pub const STABILITY_WINDOW: usize = 3;

/// Announcement queue capacity.
///
/// Announcements are status, not a log: an old unspoken one is worth less
/// than the newest, so the queue stays tiny and drops on full.
pub const QUEUE_CAPACITY: usize = 2;

/// Maximum labels spoken in one announcement.
pub const MAX_ANNOUNCED_OBJECTS: usize = 3;

/// Leading word of every announcement ("Detected: dog, person").
pub const ANNOUNCE_PREFIX: &str = "Detected";

/// How long the announcement worker waits for an item before re-checking cancellation.
pub const WAIT_TIMEOUT_MS: u64 = 1000;

/// Upper bound on a single speech-engine call.
pub const SPEAK_TIMEOUT_MS: u64 = 3000;

/// How long shutdown waits for the announcement worker to exit.
pub const SHUTDOWN_TIMEOUT_MS: u64 = 1000;

/// Default camera: first video device.
pub const CAMERA_DEVICE: &str = "0";

pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;
pub const CAMERA_FPS: u32 = 30;

/// Square input resolution handed to the detector (320, 416 or 608 for YOLOv3).
pub const DETECTOR_INPUT_SIZE: u32 = 320;

/// Default detector sidecar command.
pub const DETECTOR_COMMAND: &str = "seesay-detector";

/// Newline-separated class names, one per class id.
pub const LABELS_PATH: &str = "yolo-coco/coco.names";

/// Number of loop durations averaged for the FPS readout.
pub const FPS_WINDOW: usize = 30;

/// Default log level when neither RUST_LOG nor CLI flags say otherwise.
pub const LOG_LEVEL: &str = "info";

/// espeak speaking rate (words per minute).
pub const ESPEAK_RATE: i32 = 180;

/// macOS `say` speaking rate (words per minute).
pub const SAY_RATE: i32 = 200;

/// System.Speech synthesizer rate (-10..10).
pub const POWERSHELL_RATE: i32 = 2;
