//! Frame sampling, detection stabilization and asynchronous announcement.
//!
//! The frame loop runs on one thread and owns every piece of per-run state.
//! Announcements cross to a single worker thread through a bounded,
//! drop-on-full crossbeam channel, so speech never back-pressures capture.

pub mod announcer;
pub mod coordinator;
pub mod error;
pub mod fps;
pub mod quit;
pub mod scheduler;
pub mod stabilizer;

pub use announcer::{AnnouncementChannel, AnnouncementRequest, AnnouncerConfig};
pub use coordinator::{
    Announcement, FrameReport, Pipeline, PipelineConfig, PipelineCoordinator, RunEnd, RunStats,
    RunSummary, StepOutcome, format_announcement,
};
pub use error::{CollectingReporter, ErrorReporter, LogReporter};
pub use fps::FpsCounter;
pub use quit::{QuitSignal, QuitTrigger, quit_signal};
pub use scheduler::{FrameScheduler, should_process};
pub use stabilizer::DetectionStabilizer;
