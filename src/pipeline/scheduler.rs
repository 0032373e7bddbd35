//! Frame sampling: detection runs on every Nth frame only.

use std::num::NonZeroU64;

/// True iff `frame_index` is a multiple of `skip_interval`.
pub fn should_process(frame_index: u64, skip_interval: NonZeroU64) -> bool {
    frame_index % skip_interval.get() == 0
}

/// Detection gate for a fixed skip interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameScheduler {
    interval: NonZeroU64,
}

impl FrameScheduler {
    pub fn new(interval: NonZeroU64) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> NonZeroU64 {
        self.interval
    }

    pub fn should_process(&self, frame_index: u64) -> bool {
        should_process(frame_index, self.interval)
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(NonZeroU64::new(crate::defaults::SKIP_INTERVAL).unwrap_or(NonZeroU64::MIN))
    }
}
