//! Application entry points.
//!
//! Wires the production collaborators (ffmpeg camera, detector sidecar,
//! terminal renderer, platform speech) into the pipeline:
//! capture → detect → stabilize → announce

use crate::config::{Config, SpeechConfig};
use crate::error::{Result, SeesayError};
use crate::pipeline::{Pipeline, RunSummary, quit_signal};
use crate::speech::{CommandSpeechEngine, SilentEngine, SpeechBackend, SpeechEngine};
use crate::vision::ffmpeg::FfmpegFrameSource;
use crate::vision::labels::LabelMap;
use crate::vision::render::{NullRenderer, Renderer};
use crate::vision::sidecar::SidecarDetector;
use crate::vision::terminal::TerminalRenderer;
use std::sync::Arc;

/// Build the speech engine for the configured backend.
pub fn build_speech_engine(config: &SpeechConfig) -> Arc<dyn SpeechEngine> {
    match config.backend.resolve() {
        SpeechBackend::Silent => Arc::new(SilentEngine),
        backend => {
            Arc::new(CommandSpeechEngine::new(backend, config.timeout()).with_rate(config.rate))
        }
    }
}

/// Run the pipeline until quit, Ctrl+C or end of stream.
///
/// # Arguments
/// * `config` - Validated configuration with CLI overrides applied
/// * `max_frames` - Optional frame limit
///
/// # Returns
/// The run summary, or the frame source error that ended the run
pub async fn run_pipeline_command(config: Config, max_frames: Option<u64>) -> Result<RunSummary> {
    let mut pipeline_config = config.pipeline_config()?;
    pipeline_config.max_frames = max_frames;

    let labels = LabelMap::load(&config.detector.labels_path)?;
    tracing::info!(
        path = %config.detector.labels_path.display(),
        count = labels.len(),
        "labels loaded"
    );

    let detector = SidecarDetector::spawn(
        &config.detector.command,
        &config.detector.args,
        config.detector.input_size,
    )?;
    let source = FfmpegFrameSource::open(&config.camera)?;
    let renderer: Box<dyn Renderer> = if config.display.enabled {
        Box::new(TerminalRenderer::new())
    } else {
        Box::new(NullRenderer)
    };
    let speech = build_speech_engine(&config.speech);

    let (trigger, quit) = quit_signal();
    let coordinator = Pipeline::new(pipeline_config).start(
        Box::new(source),
        Box::new(detector),
        renderer,
        speech,
        labels,
        quit,
    )?;

    // The frame loop blocks on camera reads, so it gets its own thread.
    let mut run = tokio::task::spawn_blocking(move || coordinator.run());

    let joined = tokio::select! {
        joined = &mut run => joined,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!("failed to wait for Ctrl+C: {}", e);
            }
            tracing::info!("interrupt received, shutting down");
            trigger.trigger();
            run.await
        }
    };

    joined.map_err(|e| SeesayError::Other(format!("pipeline thread failed: {}", e)))?
}

/// Speak `text` once through the configured backend.
pub fn run_say_command(config: &Config, text: &str) -> Result<()> {
    let engine = build_speech_engine(&config.speech);
    tracing::debug!(engine = engine.name(), "speaking");
    engine.speak(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_silent_engine() {
        let config = SpeechConfig {
            backend: SpeechBackend::Silent,
            ..Default::default()
        };
        let engine = build_speech_engine(&config);
        assert_eq!(engine.name(), "silent");
        assert!(engine.speak("nothing").is_ok());
    }

    #[test]
    fn test_build_command_engine_resolves_auto() {
        let engine = build_speech_engine(&SpeechConfig::default());
        assert_ne!(engine.name(), "auto");
        assert_ne!(engine.name(), "silent");
    }

    #[test]
    fn test_say_with_silent_backend() {
        let mut config = Config::default();
        config.speech.backend = SpeechBackend::Silent;
        assert!(run_say_command(&config, "hello").is_ok());
    }

    #[tokio::test]
    async fn test_pipeline_command_fails_fast_on_missing_labels() {
        let mut config = Config::default();
        config.detector.labels_path = "/nonexistent/coco.names".into();

        assert!(matches!(
            run_pipeline_command(config, Some(1)).await,
            Err(SeesayError::LabelsNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_command_rejects_invalid_config() {
        let mut config = Config::default();
        config.stability.window = 0;

        assert!(matches!(
            run_pipeline_command(config, None).await,
            Err(SeesayError::ConfigInvalidValue { .. })
        ));
    }
}
