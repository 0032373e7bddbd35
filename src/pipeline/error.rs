//! Reporting of failures the pipeline absorbs instead of propagating.

use crate::error::SeesayError;

/// Trait for reporting absorbed component errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a pipeline component.
    fn report(&self, component: &str, error: &SeesayError);
}

/// Reporter that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, component: &str, error: &SeesayError) {
        tracing::warn!(component, "{}", error);
    }
}

/// Reporter that keeps every report, for tests.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(component, message)` pairs in report order.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, component: &str, error: &SeesayError) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((component.to_string(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        let error = SeesayError::Speech {
            message: "test error".to_string(),
        };
        // Just ensure it doesn't panic
        reporter.report("announcer", &error);
    }

    #[test]
    fn test_collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.report(
            "detector",
            &SeesayError::Detector {
                message: "boom".to_string(),
            },
        );
        reporter.report("renderer", &SeesayError::Other("closed".to_string()));

        assert_eq!(
            reporter.reports(),
            vec![
                ("detector".to_string(), "Detector failed: boom".to_string()),
                ("renderer".to_string(), "closed".to_string()),
            ]
        );
    }
}
