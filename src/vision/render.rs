//! Display of frames with their detection overlay.
//!
//! [`Renderer`] is the seam the coordinator draws through and the place quit
//! requests come from. The terminal implementation lives in `terminal.rs`.

use crate::error::Result;
use crate::vision::types::{Detection, Frame};
use std::sync::{Arc, Mutex};

/// Per-frame data drawn on top of the frame.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    /// Pipeline frame index (1-based).
    pub frame_index: u64,
    /// Whether detection ran on this frame.
    pub processed: bool,
    /// This frame's detections, not the stabilized set.
    pub detections: &'a [Detection],
    /// Rolling average loop rate.
    pub fps: f32,
}

/// Pluggable display for the pipeline.
pub trait Renderer: Send {
    /// Display a frame with its overlay.
    fn show(&mut self, frame: &Frame, overlay: &Overlay<'_>) -> Result<()>;

    /// Non-blocking check for a user quit request.
    fn poll_quit(&mut self) -> bool {
        false
    }

    /// Close the display. Called once at teardown.
    fn close(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "renderer"
    }
}

/// Renderer that displays nothing (headless runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn show(&mut self, _frame: &Frame, _overlay: &Overlay<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// What `CollectorRenderer` saw for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub frame_index: u64,
    pub processed: bool,
    pub labels: Vec<String>,
}

/// Renderer that records every overlay. Useful for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct CollectorRenderer {
    frames: Arc<Mutex<Vec<RenderedFrame>>>,
    quit_after: Option<u64>,
    closed: Arc<Mutex<bool>>,
}

impl CollectorRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request quit once this many frames have been shown.
    pub fn with_quit_after(mut self, frames: u64) -> Self {
        self.quit_after = Some(frames);
        self
    }

    /// Snapshot of the recorded frames.
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Renderer for CollectorRenderer {
    fn show(&mut self, _frame: &Frame, overlay: &Overlay<'_>) -> Result<()> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RenderedFrame {
                frame_index: overlay.frame_index,
                processed: overlay.processed,
                labels: overlay.detections.iter().map(|d| d.label.clone()).collect(),
            });
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        let shown = self.frames.lock().unwrap_or_else(|e| e.into_inner()).len() as u64;
        self.quit_after.is_some_and(|n| shown >= n)
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
