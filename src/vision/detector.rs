use crate::error::{Result, SeesayError};
use crate::vision::types::{Candidate, Frame};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for object-detection models.
///
/// This trait allows swapping implementations (sidecar process vs mock).
/// Implementations return raw candidates; confidence and NMS thresholds are
/// applied by the pipeline.
pub trait Detector: Send {
    /// Run inference on one frame.
    ///
    /// # Returns
    /// Every candidate box the model produced, or an error that the pipeline
    /// treats as fatal to this frame only.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Candidate>>;

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "detector"
    }
}

/// Scripted response for `MockDetector`.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Candidates(Vec<Candidate>),
    Failure(String),
}

/// Mock detector for testing.
///
/// Replays scripted responses in order, then keeps returning the fallback.
#[derive(Debug, Clone)]
pub struct MockDetector {
    script: VecDeque<MockResponse>,
    fallback: Vec<Candidate>,
    calls: Arc<AtomicUsize>,
}

impl MockDetector {
    /// Create a mock that finds nothing.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return these candidates once the script is exhausted.
    pub fn with_fallback(mut self, candidates: Vec<Candidate>) -> Self {
        self.fallback = candidates;
        self
    }

    /// Queue candidates for the next unscripted call.
    pub fn then_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.script.push_back(MockResponse::Candidates(candidates));
        self
    }

    /// Queue a failure for the next unscripted call.
    pub fn then_failure(mut self, message: &str) -> Self {
        self.script
            .push_back(MockResponse::Failure(message.to_string()));
        self
    }

    /// Shared counter of `infer` calls (clone before boxing the detector).
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MockDetector {
    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(MockResponse::Candidates(candidates)) => Ok(candidates),
            Some(MockResponse::Failure(message)) => Err(SeesayError::Detector { message }),
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
