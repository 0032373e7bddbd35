//! Speech through the platform's command-line synthesizer.

use crate::defaults;
use crate::error::{Result, SeesayError};
use crate::speech::engine::SpeechEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

/// Trait for running a speech subprocess (allows mocking in tests).
pub trait ProcessRunner: Send + Sync {
    /// Run `program` to completion, killing it if it outlives `timeout`.
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<()>;
}

/// Production runner using std::process::Command.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    SeesayError::SpeechToolNotFound {
                        tool: program.to_string(),
                    }
                } else {
                    SeesayError::Speech {
                        message: format!("failed to execute {}: {}", program, e),
                    }
                }
            })?;

        // Drained concurrently so a chatty synthesizer cannot fill the pipe and stall.
        let mut stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut stderr = String::new();
                if let Err(e) = pipe.read_to_string(&mut stderr) {
                    tracing::debug!("failed to read synthesizer stderr: {}", e);
                }
                stderr
            })
        });

        let deadline = Instant::now() + timeout;
        let poll_interval = Duration::from_millis(20);

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    let stderr = stderr_reader
                        .take()
                        .and_then(|reader| reader.join().ok())
                        .unwrap_or_default();
                    return Err(SeesayError::Speech {
                        message: format!("{} failed with {}: {}", program, status, stderr.trim()),
                    });
                }
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        tracing::debug!("{} exited before kill: {}", program, e);
                    }
                    if let Err(e) = child.wait() {
                        tracing::warn!("failed to reap {}: {}", program, e);
                    }
                    return Err(SeesayError::SpeechTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                Ok(None) => thread::sleep(poll_interval),
                Err(e) => {
                    return Err(SeesayError::Speech {
                        message: format!("failed to wait for {}: {}", program, e),
                    });
                }
            }
        }
    }
}

/// Which synthesizer to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// Pick by target platform.
    #[default]
    Auto,
    Espeak,
    Say,
    PowerShell,
    /// Log instead of speaking.
    Silent,
}

impl SpeechBackend {
    /// Replace `Auto` with the platform's backend.
    pub fn resolve(self) -> Self {
        match self {
            SpeechBackend::Auto if cfg!(target_os = "macos") => SpeechBackend::Say,
            SpeechBackend::Auto if cfg!(target_os = "windows") => SpeechBackend::PowerShell,
            SpeechBackend::Auto => SpeechBackend::Espeak,
            other => other,
        }
    }

    /// Executable this backend needs on PATH.
    pub fn tool(self) -> Option<&'static str> {
        match self.resolve() {
            SpeechBackend::Espeak => Some("espeak"),
            SpeechBackend::Say => Some("say"),
            SpeechBackend::PowerShell => Some("powershell"),
            SpeechBackend::Silent | SpeechBackend::Auto => None,
        }
    }

    /// Program and arguments that speak `text`, or `None` for silent output.
    pub fn invocation(self, text: &str, rate: Option<i32>) -> Option<(&'static str, Vec<String>)> {
        let backend = self.resolve();
        let tool = backend.tool()?;
        let args = match backend {
            SpeechBackend::Espeak => vec![
                "-s".to_string(),
                rate.unwrap_or(defaults::ESPEAK_RATE).to_string(),
                text.to_string(),
            ],
            SpeechBackend::Say => vec![
                "-r".to_string(),
                rate.unwrap_or(defaults::SAY_RATE).to_string(),
                text.to_string(),
            ],
            SpeechBackend::PowerShell => vec![
                "-NoProfile".to_string(),
                "-Command".to_string(),
                powershell_script(text, rate.unwrap_or(defaults::POWERSHELL_RATE)),
            ],
            SpeechBackend::Silent | SpeechBackend::Auto => return None,
        };
        Some((tool, args))
    }
}

/// System.Speech one-liner; single quotes are doubled inside the literal.
fn powershell_script(text: &str, rate: i32) -> String {
    format!(
        "Add-Type -AssemblyName System.Speech; \
         $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
         $s.Rate = {}; $s.Speak('{}')",
        rate,
        text.replace('\'', "''")
    )
}

impl fmt::Display for SpeechBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeechBackend::Auto => "auto",
            SpeechBackend::Espeak => "espeak",
            SpeechBackend::Say => "say",
            SpeechBackend::PowerShell => "powershell",
            SpeechBackend::Silent => "silent",
        };
        f.write_str(name)
    }
}

impl FromStr for SpeechBackend {
    type Err = SeesayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SpeechBackend::Auto),
            "espeak" => Ok(SpeechBackend::Espeak),
            "say" => Ok(SpeechBackend::Say),
            "powershell" => Ok(SpeechBackend::PowerShell),
            "silent" | "none" => Ok(SpeechBackend::Silent),
            other => Err(SeesayError::ConfigInvalidValue {
                key: "speech.backend".to_string(),
                message: format!(
                    "unknown backend '{}' (expected auto, espeak, say, powershell or silent)",
                    other
                ),
            }),
        }
    }
}

/// Speech engine that shells out to a synthesizer per utterance.
pub struct CommandSpeechEngine<R: ProcessRunner = SystemProcessRunner> {
    backend: SpeechBackend,
    rate: Option<i32>,
    timeout: Duration,
    runner: R,
    name: String,
}

impl CommandSpeechEngine<SystemProcessRunner> {
    pub fn new(backend: SpeechBackend, timeout: Duration) -> Self {
        Self::with_runner(backend, timeout, SystemProcessRunner)
    }
}

impl<R: ProcessRunner> CommandSpeechEngine<R> {
    pub fn with_runner(backend: SpeechBackend, timeout: Duration, runner: R) -> Self {
        let backend = backend.resolve();
        Self {
            backend,
            rate: None,
            timeout,
            runner,
            name: backend.to_string(),
        }
    }

    /// Override the backend's default speaking rate.
    pub fn with_rate(mut self, rate: Option<i32>) -> Self {
        self.rate = rate;
        self
    }

    pub fn backend(&self) -> SpeechBackend {
        self.backend
    }
}

impl<R: ProcessRunner> SpeechEngine for CommandSpeechEngine<R> {
    fn speak(&self, text: &str) -> Result<()> {
        match self.backend.invocation(text, self.rate) {
            Some((program, args)) => self.runner.run(program, &args, self.timeout),
            None => {
                tracing::debug!(text, "silent speech");
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
