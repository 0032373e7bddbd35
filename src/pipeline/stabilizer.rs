//! Temporal filtering of per-frame detections.
//!
//! A label is stable once it appears in every one of the last `window`
//! processed frames. Requiring all frames rather than a majority trades
//! recall for precision: flickering or borderline detections never qualify.

use crate::vision::types::DetectionSet;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
pub struct DetectionStabilizer {
    history: VecDeque<DetectionSet>,
    window: NonZeroUsize,
    push_empty: bool,
}

impl DetectionStabilizer {
    pub fn new(window: NonZeroUsize) -> Self {
        Self {
            history: VecDeque::with_capacity(window.get()),
            window,
            push_empty: true,
        }
    }

    /// Whether empty sets enter the history (and so break stability).
    ///
    /// When disabled, frames with nothing detected are ignored and a label
    /// only has to appear in `window` non-empty frames.
    pub fn with_push_empty(mut self, push_empty: bool) -> Self {
        self.push_empty = push_empty;
        self
    }

    pub fn window(&self) -> NonZeroUsize {
        self.window
    }

    /// Record one processed frame's labels, evicting the oldest past capacity.
    pub fn observe(&mut self, labels: DetectionSet) {
        if labels.is_empty() && !self.push_empty {
            return;
        }
        if self.history.len() == self.window.get() {
            self.history.pop_front();
        }
        self.history.push_back(labels);
    }

    /// Labels present in every one of the last `window` observations.
    ///
    /// Empty until the window has filled.
    pub fn stable_objects(&self) -> DetectionSet {
        if self.history.len() < self.window.get() {
            return DetectionSet::new();
        }
        let mut entries = self.history.iter();
        let Some(first) = entries.next() else {
            return DetectionSet::new();
        };
        let mut common = first.clone();
        for set in entries {
            if common.is_empty() {
                break;
            }
            common.retain_common(set);
        }
        common
    }

    pub fn is_stable(&self) -> bool {
        !self.stable_objects().is_empty()
    }

    /// Number of observations currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for DetectionStabilizer {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(crate::defaults::STABILITY_WINDOW).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> DetectionSet {
        labels.iter().copied().collect()
    }

    fn stabilizer(window: usize) -> DetectionStabilizer {
        DetectionStabilizer::new(NonZeroUsize::new(window).unwrap())
    }

    #[test]
    fn test_common_label_across_window_is_stable() {
        let mut s = stabilizer(3);
        s.observe(set(&["dog"]));
        s.observe(set(&["dog", "cat"]));
        assert!(!s.is_stable());
        s.observe(set(&["dog"]));

        assert!(s.is_stable());
        assert_eq!(s.stable_objects(), set(&["dog"]));
    }

    #[test]
    fn test_disjoint_labels_never_stable() {
        let mut s = stabilizer(3);
        s.observe(set(&["dog"]));
        s.observe(set(&["cat"]));
        s.observe(set(&["bird"]));

        assert!(!s.is_stable());
        assert!(s.stable_objects().is_empty());
    }

    #[test]
    fn test_not_stable_before_window_fills() {
        let mut s = stabilizer(5);
        for _ in 0..4 {
            s.observe(set(&["person"]));
            assert!(!s.is_stable());
        }
        s.observe(set(&["person"]));
        assert!(s.is_stable());
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut s = stabilizer(2);
        s.observe(set(&["cat"]));
        s.observe(set(&["dog"]));
        assert!(!s.is_stable());

        s.observe(set(&["dog"]));
        assert_eq!(s.len(), 2);
        assert_eq!(s.stable_objects(), set(&["dog"]));
    }

    #[test]
    fn test_empty_frame_breaks_stability() {
        let mut s = stabilizer(2);
        s.observe(set(&["dog"]));
        s.observe(set(&["dog"]));
        assert!(s.is_stable());

        s.observe(DetectionSet::new());
        assert!(!s.is_stable());
    }

    #[test]
    fn test_empty_frames_skipped_without_push_empty() {
        let mut s = stabilizer(2).with_push_empty(false);
        s.observe(set(&["dog"]));
        s.observe(DetectionSet::new());
        assert_eq!(s.len(), 1);

        s.observe(set(&["dog"]));
        assert!(s.is_stable());
    }

    #[test]
    fn test_alternating_labels_stay_unstable() {
        let mut s = stabilizer(3);
        for i in 0..10 {
            s.observe(set(&[if i % 2 == 0 { "dog" } else { "cat" }]));
            assert!(!s.is_stable());
        }
    }

    #[test]
    fn test_repeated_identical_sets_keep_result_constant() {
        let mut s = stabilizer(3);
        for _ in 0..3 {
            s.observe(set(&["cup", "person"]));
        }
        let first = s.stable_objects();
        for _ in 0..5 {
            s.observe(set(&["cup", "person"]));
            assert_eq!(s.stable_objects(), first);
        }
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_window_of_one() {
        let mut s = stabilizer(1);
        s.observe(set(&["car"]));
        assert_eq!(s.stable_objects(), set(&["car"]));
        s.observe(set(&["bus"]));
        assert_eq!(s.stable_objects(), set(&["bus"]));
    }
}
