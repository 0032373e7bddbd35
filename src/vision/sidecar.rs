//! Detector backed by an external model process.
//!
//! The model runs out of process and speaks a line-oriented JSON protocol:
//!
//! ```text
//! → {"width":640,"height":480,"format":"rgb24","len":921600,"input_size":320}\n<len raw bytes>
//! ← {"detections":[{"box":[x,y,w,h],"confidence":0.91,"class_id":0}]}\n
//! ← {"error":"CUDA out of memory"}\n
//! ```
//!
//! Boxes are pixel coordinates of the original frame, top-left origin.

use crate::error::{Result, SeesayError};
use crate::vision::detector::Detector;
use crate::vision::types::{BoundingBox, Candidate, Frame};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

#[derive(Debug, Serialize)]
struct FrameHeader<'a> {
    width: u32,
    height: u32,
    format: &'a str,
    len: usize,
    input_size: u32,
}

#[derive(Debug, Deserialize)]
struct SidecarReply {
    #[serde(default)]
    detections: Vec<WireDetection>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(rename = "box")]
    bbox: [f32; 4],
    confidence: f32,
    class_id: usize,
}

pub struct SidecarDetector {
    child: Option<Child>,
    writer: Box<dyn Write + Send>,
    reader: Box<dyn BufRead + Send>,
    name: String,
    input_size: u32,
    line: String,
}

impl SidecarDetector {
    /// Spawn the model process with piped stdin/stdout. Its stderr is inherited.
    pub fn spawn(command: &str, args: &[String], input_size: u32) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SeesayError::Detector {
                message: format!("failed to start detector '{}': {}", command, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| SeesayError::Detector {
            message: "failed to capture detector stdin".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| SeesayError::Detector {
            message: "failed to capture detector stdout".to_string(),
        })?;

        tracing::info!(command, "detector sidecar started");

        let mut detector = Self::from_streams(BufReader::new(stdout), stdin, input_size);
        detector.child = Some(child);
        detector.name = command.to_string();
        Ok(detector)
    }

    /// Talk the protocol over arbitrary streams (tests, sockets).
    pub fn from_streams(
        reader: impl BufRead + Send + 'static,
        writer: impl Write + Send + 'static,
        input_size: u32,
    ) -> Self {
        Self {
            child: None,
            writer: Box::new(writer),
            reader: Box::new(reader),
            name: "sidecar".to_string(),
            input_size,
            line: String::new(),
        }
    }

    fn send_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        let header = FrameHeader {
            width: frame.width,
            height: frame.height,
            format: "rgb24",
            len: frame.data.len(),
            input_size: self.input_size,
        };
        serde_json::to_writer(&mut self.writer, &header)?;
        self.writer.write_all(b"\n")?;
        self.writer.write_all(&frame.data)?;
        self.writer.flush()
    }

    fn read_reply(&mut self) -> Result<SidecarReply> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| SeesayError::DetectorProtocol {
                message: format!("failed to read reply: {}", e),
            })?;
        if read == 0 {
            return Err(SeesayError::DetectorProtocol {
                message: "detector closed its output".to_string(),
            });
        }
        serde_json::from_str(self.line.trim()).map_err(|e| SeesayError::DetectorProtocol {
            message: format!("malformed reply: {}", e),
        })
    }
}

impl Detector for SidecarDetector {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        self.send_frame(frame)
            .map_err(|e| SeesayError::DetectorProtocol {
                message: format!("failed to send frame: {}", e),
            })?;

        let reply = self.read_reply()?;
        if let Some(message) = reply.error {
            return Err(SeesayError::Detector { message });
        }

        Ok(reply
            .detections
            .into_iter()
            .map(|d| {
                Candidate::new(
                    BoundingBox::new(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]),
                    d.confidence,
                    d.class_id,
                )
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for SidecarDetector {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("detector sidecar already exited: {}", e);
            }
            if let Err(e) = child.wait() {
                tracing::warn!("failed to reap detector sidecar: {}", e);
            }
        }
    }
}
