use crate::models::RawBox;

/// Class-wise non-maximum suppression.
///
/// Keeps the most confident box of every overlapping group of the same class,
/// returns survivors by descending confidence, at most `max_detections`.
pub fn non_max_suppression(mut boxes: Vec<RawBox>, iou_threshold: f32, max_detections: usize) -> Vec<RawBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .unwrap_or(0.0)
            .total_cmp(&a.confidence.unwrap_or(0.0))
    });

    let mut kept: Vec<RawBox> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn raw(class: usize, conf: f32, x: f32) -> RawBox {
        RawBox {
            class_index: Some(class),
            confidence: Some(conf),
            bbox: BoundingBox::from_corners(x, 0.0, x + 10.0, 10.0),
        }
    }

    #[test]
    fn overlapping_same_class_keeps_best() {
        let kept = non_max_suppression(vec![raw(0, 0.5, 1.0), raw(0, 0.9, 0.0)], 0.45, 100);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, Some(0.9));
    }

    #[test]
    fn overlapping_different_classes_survive() {
        let kept = non_max_suppression(vec![raw(0, 0.5, 0.0), raw(1, 0.9, 0.0)], 0.45, 100);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].class_index, Some(1));
    }

    #[test]
    fn cap_on_detections() {
        let boxes = (0..5).map(|i| raw(0, 0.5, i as f32 * 100.0)).collect();
        assert_eq!(non_max_suppression(boxes, 0.45, 3).len(), 3);
    }
}
