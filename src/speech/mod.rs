//! Spoken output.

pub mod command;
pub mod engine;

pub use command::{CommandSpeechEngine, ProcessRunner, SpeechBackend, SystemProcessRunner};
pub use engine::{MockSpeechEngine, SilentEngine, SpeechEngine};
