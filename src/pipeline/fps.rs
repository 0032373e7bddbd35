use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Rolling average of the main loop rate.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    samples: VecDeque<Duration>,
    capacity: NonZeroUsize,
    last_tick: Option<Instant>,
}

impl FpsCounter {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
            last_tick: None,
        }
    }

    /// Mark the end of one loop iteration.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            self.record(now.saturating_duration_since(last));
        }
        self.last_tick = Some(now);
    }

    /// Add one iteration duration directly.
    pub fn record(&mut self, elapsed: Duration) {
        if self.samples.len() == self.capacity.get() {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    /// Average frames per second over the window; 0.0 with no samples.
    pub fn fps(&self) -> f32 {
        let total: Duration = self.samples.iter().sum();
        if self.samples.is_empty() || total.is_zero() {
            return 0.0;
        }
        self.samples.len() as f32 / total.as_secs_f32()
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(crate::defaults::FPS_WINDOW).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_counter_reports_zero() {
        assert_eq!(FpsCounter::default().fps(), 0.0);
    }

    #[test]
    fn test_average_over_samples() {
        let mut fps = FpsCounter::default();
        fps.record(Duration::from_millis(40));
        fps.record(Duration::from_millis(60));
        assert!((fps.fps() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut fps = FpsCounter::new(NonZeroUsize::new(2).unwrap());
        fps.record(Duration::from_secs(10));
        fps.record(Duration::from_millis(100));
        fps.record(Duration::from_millis(100));
        assert!((fps.fps() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_tick_at_measures_intervals() {
        let mut fps = FpsCounter::default();
        let start = Instant::now();
        fps.tick_at(start);
        assert_eq!(fps.fps(), 0.0);
        fps.tick_at(start + Duration::from_millis(50));
        fps.tick_at(start + Duration::from_millis(100));
        assert!((fps.fps() - 20.0).abs() < 0.01);
    }
}
