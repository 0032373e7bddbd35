//! Error types for seesay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeesayError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Frame source errors
    #[error("Frame source unavailable: {message}")]
    FrameSourceOpen { message: String },

    #[error("Frame acquisition failed: {message}")]
    FrameRead { message: String },

    // Detection errors
    #[error("Label file not found at {path}")]
    LabelsNotFound { path: String },

    #[error("Detector failed: {message}")]
    Detector { message: String },

    #[error("Detector protocol error: {message}")]
    DetectorProtocol { message: String },

    // Speech errors
    #[error("Speech tool not found: {tool}")]
    SpeechToolNotFound { tool: String },

    #[error("Speech timed out after {timeout_ms}ms")]
    SpeechTimeout { timeout_ms: u64 },

    #[error("Speech failed: {message}")]
    Speech { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SeesayError>;
