use crate::error::{Result, SeesayError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Trait for text-to-speech output.
///
/// Calls are synchronous and must be bounded by the implementation's own
/// timeout. Failures are reported to the caller but are never fatal to it.
pub trait SpeechEngine: Send + Sync {
    /// Speak `text`, returning once speech finished, failed or timed out.
    fn speak(&self, text: &str) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &str {
        "speech"
    }
}

impl<T: SpeechEngine + ?Sized> SpeechEngine for Arc<T> {
    fn speak(&self, text: &str) -> Result<()> {
        (**self).speak(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Engine that only logs what it would have said.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEngine;

impl SpeechEngine for SilentEngine {
    fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "silent speech");
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Mock speech engine for testing
#[derive(Debug, Clone, Default)]
pub struct MockSpeechEngine {
    spoken: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
    should_fail: bool,
    should_panic: bool,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `speak` call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Configure the mock to fail on speak
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to panic on speak
    pub fn with_panic(mut self) -> Self {
        self.should_panic = true;
        self
    }

    /// Texts spoken successfully, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of `speak` invocations, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn speak(&self, text: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.should_panic {
            panic!("mock speech engine panic");
        }
        if self.should_fail {
            return Err(SeesayError::Speech {
                message: "mock speech failure".to_string(),
            });
        }
        self.spoken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_spoken_text() {
        let engine = MockSpeechEngine::new();
        engine.speak("Detected: person").unwrap();
        engine.speak("Detected: dog").unwrap();

        assert_eq!(engine.spoken(), vec!["Detected: person", "Detected: dog"]);
        assert_eq!(engine.call_count(), 2);
    }

    #[test]
    fn test_mock_failure_counts_call_but_records_nothing() {
        let engine = MockSpeechEngine::new().with_failure();

        match engine.speak("hello") {
            Err(SeesayError::Speech { message }) => assert_eq!(message, "mock speech failure"),
            other => panic!("Expected Speech error, got {:?}", other),
        }
        assert_eq!(engine.call_count(), 1);
        assert!(engine.spoken().is_empty());
    }

    #[test]
    fn test_arc_engine_delegates() {
        let mock = MockSpeechEngine::new();
        let shared: Arc<dyn SpeechEngine> = Arc::new(mock.clone());

        shared.speak("hi").unwrap();
        assert_eq!(shared.name(), "mock");
        assert_eq!(mock.spoken(), vec!["hi"]);
    }

    #[test]
    fn test_silent_engine_succeeds() {
        assert!(SilentEngine.speak("anything").is_ok());
        assert_eq!(SilentEngine.name(), "silent");
    }
}
