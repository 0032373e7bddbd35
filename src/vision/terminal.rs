//! Terminal renderer: detection status lines on stderr, `q` + Enter to quit.

use crate::error::Result;
use crate::vision::render::{Overlay, Renderer};
use crate::vision::types::Frame;
use crossbeam_channel::{Receiver, bounded};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, IsTerminal};
use std::thread;

pub struct TerminalRenderer {
    quit_rx: Option<Receiver<()>>,
    last_summary: Option<String>,
}

impl TerminalRenderer {
    /// Create a renderer; listens for `q` only when stdin is interactive.
    pub fn new() -> Self {
        let quit_rx = if io::stdin().is_terminal() {
            spawn_quit_listener()
        } else {
            None
        };
        Self {
            quit_rx,
            last_summary: None,
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads stdin lines on a detached thread; it dies with the process.
fn spawn_quit_listener() -> Option<Receiver<()>> {
    let (tx, rx) = bounded(1);
    let spawned = thread::Builder::new()
        .name("quit-listener".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) if is_quit_command(&line) => {
                        tx.try_send(()).ok();
                        break;
                    }
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
        });

    match spawned {
        Ok(_) => Some(rx),
        Err(e) => {
            tracing::warn!("quit listener unavailable: {}", e);
            None
        }
    }
}

pub fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "q" | "Q" | "quit")
}

/// `"person 0.91, dog 0.77"`, or `"-"` when nothing was detected.
pub fn format_detections(overlay: &Overlay<'_>) -> String {
    if overlay.detections.is_empty() {
        return "-".to_string();
    }
    overlay
        .detections
        .iter()
        .map(|d| format!("{} {:.2}", d.label, d.confidence))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Status line shown for processed frames.
pub fn format_status(overlay: &Overlay<'_>) -> String {
    format!(
        "FPS: {:.1} | Objects: {} | {}",
        overlay.fps,
        overlay.detections.len(),
        format_detections(overlay)
    )
}

impl Renderer for TerminalRenderer {
    fn show(&mut self, _frame: &Frame, overlay: &Overlay<'_>) -> Result<()> {
        if !overlay.processed {
            return Ok(());
        }

        // Only print when what is seen changes.
        let summary = format_detections(overlay);
        if self.last_summary.as_deref() == Some(summary.as_str()) {
            return Ok(());
        }

        let frame_tag = format!("[frame {:>6}]", overlay.frame_index);
        if overlay.detections.is_empty() {
            eprintln!("{} {}", frame_tag.dimmed(), format_status(overlay).dimmed());
        } else {
            eprintln!("{} {}", frame_tag.dimmed(), format_status(overlay).green());
        }
        self.last_summary = Some(summary);
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        match &self.quit_rx {
            Some(rx) => matches!(rx.try_recv(), Ok(())),
            None => false,
        }
    }

    fn close(&mut self) {
        self.quit_rx = None;
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::{BoundingBox, Detection};

    fn detection(label: &str, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            confidence,
            class_id: 0,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_is_quit_command() {
        assert!(is_quit_command("q"));
        assert!(is_quit_command(" Q \n"));
        assert!(is_quit_command("quit"));
        assert!(!is_quit_command("query"));
        assert!(!is_quit_command(""));
    }

    #[test]
    fn test_format_status() {
        let detections = vec![detection("person", 0.912), detection("dog", 0.77)];
        let overlay = Overlay {
            frame_index: 9,
            processed: true,
            detections: &detections,
            fps: 29.96,
        };
        assert_eq!(
            format_status(&overlay),
            "FPS: 30.0 | Objects: 2 | person 0.91, dog 0.77"
        );
    }

    #[test]
    fn test_format_status_empty() {
        let overlay = Overlay {
            frame_index: 3,
            processed: true,
            detections: &[],
            fps: 0.0,
        };
        assert_eq!(format_status(&overlay), "FPS: 0.0 | Objects: 0 | -");
    }
}
