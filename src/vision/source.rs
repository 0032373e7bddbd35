use crate::error::{Result, SeesayError};
use crate::vision::types::Frame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for frame sources (camera, file, mock).
///
/// Reads block until a frame is available. Any error, and `Ok(None)`, ends the run.
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// # Returns
    /// `Ok(Some(frame))` on success, `Ok(None)` at end of stream,
    /// or an error if acquisition failed
    fn read(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Called once at teardown.
    fn release(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "source"
    }
}

/// Mock frame source for testing.
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    width: u32,
    height: u32,
    frames: u64,
    produced: u64,
    fail_after: Option<u64>,
    released: Arc<AtomicBool>,
}

impl MockFrameSource {
    /// Create a source that yields `frames` blank frames then ends.
    pub fn new(frames: u64) -> Self {
        Self {
            width: 4,
            height: 4,
            frames,
            produced: 0,
            fail_after: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configure the frame size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Fail the read after `frames` successful reads instead of ending cleanly.
    pub fn with_failure_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Shared flag set by `release()` (clone before boxing the source).
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }
}

impl FrameSource for MockFrameSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if self.fail_after.is_some_and(|n| self.produced >= n) {
            return Err(SeesayError::FrameRead {
                message: "mock camera disconnected".to_string(),
            });
        }
        if self.produced >= self.frames {
            return Ok(None);
        }
        self.produced += 1;
        Ok(Some(Frame::blank(self.width, self.height, self.produced)))
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "mock"
    }
}
