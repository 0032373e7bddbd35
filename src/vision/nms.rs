//! Confidence filtering and non-max suppression of detector candidates.
//!
//! The detector hands back raw, overlapping boxes. Thresholds are applied here,
//! not assumed to be pre-filtered by the model.

use crate::vision::labels::LabelMap;
use crate::vision::types::{Candidate, Detection};

/// Keeps candidates whose confidence is strictly above `threshold`.
pub fn filter_by_confidence(candidates: Vec<Candidate>, threshold: f32) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.confidence > threshold)
        .collect()
}

/// Greedy class-agnostic NMS.
///
/// Visits candidates from highest to lowest confidence and drops any box whose
/// IoU with an already-kept box exceeds `iou_threshold`. Returns indices into
/// `candidates` of the kept boxes, highest confidence first.
pub fn non_max_suppression(candidates: &[Candidate], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .confidence
            .total_cmp(&candidates[a].confidence)
    });

    let mut kept: Vec<usize> = Vec::new();
    for idx in order {
        let bbox = &candidates[idx].bbox;
        let overlaps = kept
            .iter()
            .any(|&k| candidates[k].bbox.iou(bbox) > iou_threshold);
        if !overlaps {
            kept.push(idx);
        }
    }
    kept
}

/// Threshold → NMS → label lookup.
pub fn postprocess(
    candidates: Vec<Candidate>,
    confidence_threshold: f32,
    nms_threshold: f32,
    labels: &LabelMap,
) -> Vec<Detection> {
    let candidates = filter_by_confidence(candidates, confidence_threshold);
    non_max_suppression(&candidates, nms_threshold)
        .into_iter()
        .map(|idx| {
            let c = &candidates[idx];
            Detection {
                bbox: c.bbox,
                confidence: c.confidence,
                class_id: c.class_id,
                label: labels.name(c.class_id),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::BoundingBox;

    fn candidate(x: f32, confidence: f32, class_id: usize) -> Candidate {
        Candidate::new(BoundingBox::new(x, 0.0, 100.0, 100.0), confidence, class_id)
    }

    #[test]
    fn test_filter_is_strictly_greater_than() {
        let kept = filter_by_confidence(
            vec![candidate(0.0, 0.6, 0), candidate(0.0, 0.61, 0)],
            0.6,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.61);
    }

    #[test]
    fn test_nms_collapses_overlapping_boxes() {
        // Shifted by 5px: IoU ≈ 0.90
        let candidates = vec![candidate(0.0, 0.7, 0), candidate(5.0, 0.9, 0)];
        let kept = non_max_suppression(&candidates, 0.4);
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn test_nms_keeps_separated_boxes_in_confidence_order() {
        let candidates = vec![candidate(0.0, 0.7, 0), candidate(500.0, 0.9, 1)];
        let kept = non_max_suppression(&candidates, 0.4);
        assert_eq!(kept, vec![1, 0]);
    }

    #[test]
    fn test_nms_is_class_agnostic() {
        let candidates = vec![candidate(0.0, 0.9, 0), candidate(2.0, 0.8, 16)];
        let kept = non_max_suppression(&candidates, 0.4);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(non_max_suppression(&[], 0.4).is_empty());
    }

    #[test]
    fn test_postprocess_resolves_labels() {
        let labels = LabelMap::from_labels(["person", "bicycle"]);
        let detections = postprocess(
            vec![
                candidate(0.0, 0.95, 0),
                candidate(3.0, 0.80, 0),   // duplicate person box
                candidate(400.0, 0.75, 1), // separate bicycle
                candidate(800.0, 0.30, 1), // below threshold
            ],
            0.6,
            0.4,
            &labels,
        );

        let names: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(names, vec!["person", "bicycle"]);
    }
}
