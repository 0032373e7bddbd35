//! seesay - speak what the camera sees
//!
//! Samples frames from a camera, runs object detection on every Nth frame,
//! waits for detections to persist across several processed frames, then
//! announces them through text-to-speech without ever stalling capture.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod speech;
pub mod vision;

// Composition root - needs the terminal renderer
#[cfg(feature = "cli")]
pub mod app;

// Collaborator traits (source → detector → renderer / speech)
pub use speech::SpeechEngine;
pub use vision::{Detector, FrameSource, Renderer};

// Pipeline
pub use pipeline::{
    AnnouncementChannel, DetectionStabilizer, FrameScheduler, Pipeline, PipelineConfig,
    PipelineCoordinator, QuitSignal, QuitTrigger, RunEnd, RunSummary, quit_signal,
};

// Error handling
pub use error::{Result, SeesayError};

// Config
pub use config::Config;

pub use pipeline::ErrorReporter;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
