//! Data types flowing from the camera through detection.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// A single captured frame (packed rgb24).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data, `width * height * 3` bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Source-side sequence number.
    pub sequence: u64,
    /// Timestamp when this frame was read.
    pub timestamp: Instant,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Creates an all-black frame of the given size.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self::new(
            vec![0u8; Self::byte_len(width, height)],
            width,
            height,
            sequence,
        )
    }

    /// Number of bytes in an rgb24 frame of this size.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// Axis-aligned box in pixel coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from a YOLO-style center representation.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union; 0.0 for disjoint or degenerate boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Raw detector output before thresholding and NMS.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: usize,
}

impl Candidate {
    pub fn new(bbox: BoundingBox, confidence: f32, class_id: usize) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}

/// A kept detection with its resolved label.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: usize,
    pub label: String,
}

/// Deduplicated labels seen in one processed frame.
///
/// Backed by an ordered set so iteration (and therefore which labels make it
/// into a truncated announcement) is lexicographic and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSet {
    labels: BTreeSet<String>,
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapses detections to their labels; repeated labels count once.
    pub fn from_detections(detections: &[Detection]) -> Self {
        detections.iter().map(|d| d.label.as_str()).collect()
    }

    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.labels.insert(label.into())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Labels in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Keeps only labels also present in `other`.
    pub fn retain_common(&mut self, other: &DetectionSet) {
        self.labels.retain(|label| other.labels.contains(label));
    }
}

impl<S: Into<String>> FromIterator<S> for DetectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for DetectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label}")?;
        }
        write!(f, "}}")
    }
}
