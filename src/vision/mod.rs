//! Frame capture, object detection and display.

pub mod detector;
pub mod ffmpeg;
pub mod labels;
pub mod nms;
pub mod render;
pub mod sidecar;
pub mod source;
#[cfg(feature = "cli")]
pub mod terminal;
pub mod types;

pub use detector::{Detector, MockDetector, MockResponse};
pub use ffmpeg::FfmpegFrameSource;
pub use labels::LabelMap;
pub use render::{CollectorRenderer, NullRenderer, Overlay, RenderedFrame, Renderer};
pub use sidecar::SidecarDetector;
pub use source::{FrameSource, MockFrameSource};
pub use types::{BoundingBox, Candidate, Detection, DetectionSet, Frame};
