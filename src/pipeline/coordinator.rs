//! The per-frame loop: acquire, maybe detect, stabilize, maybe announce,
//! render, check for quit.
//!
//! Everything here runs on the caller's thread. The only concurrency is the
//! announcement worker, reached solely through its bounded queue.

use crate::defaults;
use crate::error::Result;
use crate::pipeline::announcer::{AnnouncementChannel, AnnouncerConfig};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::fps::FpsCounter;
use crate::pipeline::quit::QuitSignal;
use crate::pipeline::scheduler::FrameScheduler;
use crate::pipeline::stabilizer::DetectionStabilizer;
use crate::speech::SpeechEngine;
use crate::vision::detector::Detector;
use crate::vision::labels::LabelMap;
use crate::vision::nms::postprocess;
use crate::vision::render::{Overlay, Renderer};
use crate::vision::source::FrameSource;
use crate::vision::types::{Detection, DetectionSet, Frame};
use std::fmt;
use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::Arc;

/// Immutable tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidates must score strictly above this.
    pub confidence_threshold: f32,
    /// Boxes overlapping a stronger box by more than this IoU are dropped.
    pub nms_threshold: f32,
    /// Detection runs on frames whose index is a multiple of this.
    pub skip_interval: NonZeroU64,
    /// Processed frames a label must persist across to be announced.
    pub window: NonZeroUsize,
    /// Whether frames with no detections enter the stability window.
    pub push_empty: bool,
    /// Labels per announcement.
    pub max_objects: NonZeroUsize,
    /// Announcement text prefix, e.g. `"Detected"`.
    pub prefix: String,
    /// Skip announcing a stable set identical to the last accepted one.
    pub suppress_repeats: bool,
    pub announcer: AnnouncerConfig,
    /// Loop iterations averaged for the FPS readout.
    pub fps_window: NonZeroUsize,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            nms_threshold: defaults::NMS_THRESHOLD,
            skip_interval: NonZeroU64::new(defaults::SKIP_INTERVAL).unwrap_or(NonZeroU64::MIN),
            window: NonZeroUsize::new(defaults::STABILITY_WINDOW).unwrap_or(NonZeroUsize::MIN),
            push_empty: true,
            max_objects: NonZeroUsize::new(defaults::MAX_ANNOUNCED_OBJECTS)
                .unwrap_or(NonZeroUsize::MIN),
            prefix: defaults::ANNOUNCE_PREFIX.to_string(),
            suppress_repeats: false,
            announcer: AnnouncerConfig::default(),
            fps_window: NonZeroUsize::new(defaults::FPS_WINDOW).unwrap_or(NonZeroUsize::MIN),
            max_frames: None,
        }
    }
}

/// `"<prefix>: a, b, c"` from the first `max` labels in lexicographic order.
pub fn format_announcement(prefix: &str, objects: &DetectionSet, max: NonZeroUsize) -> String {
    let names: Vec<&str> = objects.iter().take(max.get()).collect();
    format!("{}: {}", prefix, names.join(", "))
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// User or signal requested quit.
    Quit,
    /// The source has no more frames.
    EndOfStream,
    /// `max_frames` reached.
    FrameLimit,
}

impl fmt::Display for RunEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEnd::Quit => write!(f, "quit requested"),
            RunEnd::EndOfStream => write!(f, "end of stream"),
            RunEnd::FrameLimit => write!(f, "frame limit reached"),
        }
    }
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub processed_frames: u64,
    pub announcements_accepted: u64,
    pub announcements_dropped: u64,
    pub detector_failures: u64,
    /// Text of the most recent accepted announcement.
    pub last_announcement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub end: RunEnd,
    pub stats: RunStats,
}

/// An announcement attempted on a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    /// False when the queue was full and the text was dropped.
    pub accepted: bool,
}

/// What happened on one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    pub processed: bool,
    /// This frame's detections after thresholding and NMS.
    pub detections: Vec<Detection>,
    /// Stable labels after this frame's observation.
    pub stable: DetectionSet,
    pub announcement: Option<Announcement>,
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Frame(FrameReport),
    Finished(RunEnd),
}

/// Builder for a pipeline run.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the announcement worker and returns the coordinator.
    ///
    /// The frame loop itself runs on whichever thread calls
    /// [`PipelineCoordinator::run`] or [`PipelineCoordinator::step`].
    pub fn start(
        self,
        source: Box<dyn FrameSource>,
        detector: Box<dyn Detector>,
        renderer: Box<dyn Renderer>,
        speech: Arc<dyn SpeechEngine>,
        labels: LabelMap,
        quit: QuitSignal,
    ) -> Result<PipelineCoordinator> {
        let announcer = AnnouncementChannel::spawn_with_reporter(
            speech,
            self.config.announcer,
            self.error_reporter.clone(),
        )?;

        tracing::info!(
            source = source.name(),
            detector = detector.name(),
            renderer = renderer.name(),
            skip_interval = self.config.skip_interval.get(),
            window = self.config.window.get(),
            queue_capacity = announcer.capacity().get(),
            "pipeline started"
        );

        Ok(PipelineCoordinator {
            scheduler: FrameScheduler::new(self.config.skip_interval),
            stabilizer: DetectionStabilizer::new(self.config.window)
                .with_push_empty(self.config.push_empty),
            fps: FpsCounter::new(self.config.fps_window),
            source,
            detector,
            renderer,
            labels,
            quit,
            announcer,
            reporter: self.error_reporter,
            config: self.config,
            frame_index: 0,
            stats: RunStats::default(),
            last_announced: None,
            torn_down: false,
        })
    }
}

/// Owns every pipeline resource for the duration of a run.
pub struct PipelineCoordinator {
    config: PipelineConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    renderer: Box<dyn Renderer>,
    labels: LabelMap,
    quit: QuitSignal,
    scheduler: FrameScheduler,
    stabilizer: DetectionStabilizer,
    announcer: AnnouncementChannel,
    fps: FpsCounter,
    reporter: Arc<dyn ErrorReporter>,
    frame_index: u64,
    stats: RunStats,
    last_announced: Option<DetectionSet>,
    torn_down: bool,
}

impl PipelineCoordinator {
    /// Loop until quit, end of stream or a frame source failure, then tear down.
    ///
    /// Resources are released on every exit path. Only a frame source
    /// failure is returned as an error.
    pub fn run(mut self) -> Result<RunSummary> {
        let result = loop {
            match self.step() {
                Ok(StepOutcome::Frame(_)) => continue,
                Ok(StepOutcome::Finished(end)) => break Ok(end),
                Err(e) => break Err(e),
            }
        };
        self.shutdown();

        match result {
            Ok(end) => {
                tracing::info!(
                    frames = self.stats.frames,
                    processed = self.stats.processed_frames,
                    announced = self.stats.announcements_accepted,
                    dropped = self.stats.announcements_dropped,
                    "pipeline finished: {}",
                    end
                );
                Ok(RunSummary {
                    end,
                    stats: self.stats.clone(),
                })
            }
            Err(e) => {
                tracing::error!(frames = self.stats.frames, "pipeline aborted: {}", e);
                Err(e)
            }
        }
    }

    /// Advance by one frame.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.renderer.poll_quit() || self.quit.is_raised() {
            return Ok(StepOutcome::Finished(RunEnd::Quit));
        }
        if self
            .config
            .max_frames
            .is_some_and(|limit| self.frame_index >= limit)
        {
            return Ok(StepOutcome::Finished(RunEnd::FrameLimit));
        }

        let Some(frame) = self.source.read()? else {
            return Ok(StepOutcome::Finished(RunEnd::EndOfStream));
        };
        self.frame_index += 1;
        self.stats.frames += 1;

        let processed = self.scheduler.should_process(self.frame_index);
        let mut detections = Vec::new();
        let mut announcement = None;
        if processed {
            self.stats.processed_frames += 1;
            detections = self.detect(&frame);
            let labels = DetectionSet::from_detections(&detections);
            tracing::debug!(frame = self.frame_index, labels = %labels, "processed");
            self.stabilizer.observe(labels);
            announcement = self.maybe_announce();
        }

        self.fps.tick();
        self.render(&frame, processed, &detections);

        Ok(StepOutcome::Frame(FrameReport {
            frame_index: self.frame_index,
            processed,
            detections,
            stable: self.stabilizer.stable_objects(),
            announcement,
        }))
    }

    fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        match self.detector.infer(frame) {
            Ok(candidates) => postprocess(
                candidates,
                self.config.confidence_threshold,
                self.config.nms_threshold,
                &self.labels,
            ),
            Err(e) => {
                self.stats.detector_failures += 1;
                self.reporter.report("detector", &e);
                Vec::new()
            }
        }
    }

    fn maybe_announce(&mut self) -> Option<Announcement> {
        let stable = self.stabilizer.stable_objects();
        if stable.is_empty() {
            self.last_announced = None;
            return None;
        }
        if self.config.suppress_repeats && self.last_announced.as_ref() == Some(&stable) {
            return None;
        }

        let text = format_announcement(&self.config.prefix, &stable, self.config.max_objects);
        let accepted = self.announcer.try_announce(text.clone());
        if accepted {
            tracing::debug!(frame = self.frame_index, text = %text, "announcement queued");
            self.stats.announcements_accepted += 1;
            self.stats.last_announcement = Some(text.clone());
            self.last_announced = Some(stable);
        } else {
            tracing::debug!(
                frame = self.frame_index,
                text = %text,
                pending = self.announcer.pending(),
                "announcement dropped, queue full"
            );
            self.stats.announcements_dropped += 1;
        }
        Some(Announcement { text, accepted })
    }

    fn render(&mut self, frame: &Frame, processed: bool, detections: &[Detection]) {
        let overlay = Overlay {
            frame_index: self.frame_index,
            processed,
            detections,
            fps: self.fps.fps(),
        };
        if let Err(e) = self.renderer.show(frame, &overlay) {
            self.reporter.report(self.renderer.name(), &e);
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Release the source, close the renderer and stop the announcer. Idempotent.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.source.release();
        self.renderer.close();
        if !self.announcer.shutdown() {
            tracing::warn!("announcement worker did not stop in time");
        }
        tracing::debug!("pipeline resources released");
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
