//! Command-line interface for seesay
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use crate::speech::SpeechBackend;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speak what the camera sees
#[derive(Parser, Debug)]
#[command(name = "seesay", version, about = "Speak what the camera sees")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-frame decisions, -vv: everything)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Camera index, device path, video file or stream URL
    #[arg(long, short = 'i', value_name = "SOURCE")]
    pub input: Option<String>,

    /// Do not print per-frame status lines
    #[arg(long)]
    pub headless: bool,

    /// Speech backend (auto, espeak, say, powershell, silent)
    #[arg(long, global = true, value_name = "BACKEND", value_parser = parse_backend)]
    pub speech_backend: Option<SpeechBackend>,

    /// Per-utterance speech timeout. Examples: 3s, 1500ms
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_millis)]
    pub speech_timeout: Option<u64>,

    /// Run detection on every Nth frame
    #[arg(long, value_name = "N")]
    pub skip: Option<u64>,

    /// Processed frames a label must persist across before it is announced
    #[arg(long, value_name = "W")]
    pub window: Option<usize>,

    /// Minimum detection confidence (0.0-1.0)
    #[arg(long, value_name = "T")]
    pub confidence: Option<f32>,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    pub max_frames: Option<u64>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.camera.device = input.clone();
        }
        if self.headless {
            config.display.enabled = false;
        }
        if let Some(backend) = self.speech_backend {
            config.speech.backend = backend;
        }
        if let Some(timeout_ms) = self.speech_timeout {
            config.speech.timeout_ms = timeout_ms;
        }
        if let Some(skip) = self.skip {
            config.detection.skip_interval = skip;
        }
        if let Some(window) = self.window {
            config.stability.window = window;
        }
        if let Some(confidence) = self.confidence {
            config.detection.confidence_threshold = confidence;
        }
    }
}

fn parse_backend(s: &str) -> Result<SpeechBackend, String> {
    s.parse().map_err(|e: crate::error::SeesayError| e.to_string())
}

/// Parse a duration into milliseconds.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`3s`, `1500ms`, `1s 500ms`).
fn parse_millis(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that ffmpeg, the speech tool, the detector and the labels file are available
    Check,

    /// Speak a sentence through the configured speech backend
    Say {
        /// Text to speak
        text: String,
    },

    /// View and create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["seesay"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.input.is_none());
        assert!(!cli.headless);
        assert!(cli.speech_backend.is_none());
        assert!(cli.speech_timeout.is_none());
        assert!(cli.skip.is_none());
        assert!(cli.window.is_none());
        assert!(cli.max_frames.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["seesay", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_with_options() {
        let cli = Cli::try_parse_from([
            "seesay",
            "--input",
            "clip.mp4",
            "--headless",
            "--speech-backend",
            "silent",
            "--speech-timeout",
            "2s",
            "--skip",
            "5",
            "--window",
            "4",
            "--confidence",
            "0.7",
            "--max-frames",
            "300",
        ])
        .unwrap();

        assert_eq!(cli.input.as_deref(), Some("clip.mp4"));
        assert!(cli.headless);
        assert_eq!(cli.speech_backend, Some(SpeechBackend::Silent));
        assert_eq!(cli.speech_timeout, Some(2000));
        assert_eq!(cli.skip, Some(5));
        assert_eq!(cli.window, Some(4));
        assert_eq!(cli.confidence, Some(0.7));
        assert_eq!(cli.max_frames, Some(300));
    }

    #[test]
    fn test_parse_speech_timeout_bare_millis() {
        let cli = Cli::try_parse_from(["seesay", "--speech-timeout", "1500"]).unwrap();
        assert_eq!(cli.speech_timeout, Some(1500));
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["seesay", "--speech-backend", "festival"]).is_err());
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["seesay", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_parse_say_with_global_backend() {
        let cli =
            Cli::try_parse_from(["seesay", "say", "hello there", "--speech-backend", "espeak"])
                .unwrap();
        match cli.command {
            Some(Commands::Say { text }) => assert_eq!(text, "hello there"),
            _ => panic!("Expected Say command"),
        }
        assert_eq!(cli.speech_backend, Some(SpeechBackend::Espeak));
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["seesay", "config", "init", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Init { force },
            }) => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["seesay", "--config", "/path/to/config.toml", "check"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["seesay", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "seesay",
            "--input",
            "/dev/video1",
            "--headless",
            "--skip",
            "2",
            "--window",
            "5",
            "--speech-backend",
            "say",
        ])
        .unwrap();
        let mut config = Config::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.camera.device, "/dev/video1");
        assert!(!config.display.enabled);
        assert_eq!(config.detection.skip_interval, 2);
        assert_eq!(config.stability.window, 5);
        assert_eq!(config.speech.backend, SpeechBackend::Say);
        assert_eq!(config.detection.confidence_threshold, 0.6);
    }

    #[test]
    fn test_apply_no_overrides_keeps_config() {
        let cli = Cli::try_parse_from(["seesay"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config, Config::default());
    }
}
