//! Greedy per-class non-maximum suppression.

use super::candidates::Candidate;
use std::collections::BTreeMap;

/// Added to the IoU denominator so zero-area boxes do not divide by zero.
pub const IOU_EPSILON: f32 = 1e-6;

pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = w * h;
    inter / (a.area() + b.area() - inter + IOU_EPSILON)
}

/// Run NMS independently for every class.
///
/// Output is grouped by ascending class id; within a class, boxes appear in
/// the order the greedy pass selected them (descending score, input order on ties).
pub fn non_max_suppression(candidates: &[Candidate], iou_thres: f32) -> Vec<Candidate> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, c) in candidates.iter().enumerate() {
        by_class.entry(c.class_id).or_default().push(i);
    }

    let mut kept = Vec::with_capacity(candidates.len());
    for indices in by_class.values() {
        let class_boxes: Vec<Candidate> = indices.iter().map(|&i| candidates[i]).collect();
        kept.extend(
            nms_single_class(&class_boxes, iou_thres)
                .into_iter()
                .map(|i| class_boxes[i]),
        );
    }
    kept
}

/// Greedy NMS over boxes of one class. Returns kept indices in selection order.
///
/// A box is dropped when its IoU with an already kept box exceeds `iou_thres`.
pub fn nms_single_class(boxes: &[Candidate], iou_thres: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    // Stable: equal scores keep their input order
    order.sort_by(|&a, &b| boxes[b].score.total_cmp(&boxes[a].score));

    let mut suppressed = vec![false; boxes.len()];
    let mut keep = Vec::with_capacity(boxes.len());

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);
        for &j in &order[pos + 1..] {
            if !suppressed[j] && iou(&boxes[i], &boxes[j]) > iou_thres {
                suppressed[j] = true;
            }
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x1: f32, y1: f32, x2: f32, y2: f32, class_id: usize, score: f32) -> Candidate {
        Candidate {
            x1,
            y1,
            x2,
            y2,
            class_id,
            score,
        }
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = boxed(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        let b = boxed(20.0, 20.0, 30.0, 30.0, 0, 0.9);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn degenerate_boxes_do_not_divide_by_zero() {
        let point = boxed(5.0, 5.0, 5.0, 5.0, 0, 0.9);
        let value = iou(&point, &point);
        assert!(value.is_finite());
        assert_eq!(value, 0.0);
    }

    #[test]
    fn suppresses_overlap_above_threshold() {
        // IoU = 81 / 119 ~= 0.68
        let boxes = [
            boxed(1.0, 1.0, 11.0, 11.0, 0, 0.8),
            boxed(0.0, 0.0, 10.0, 10.0, 0, 0.9),
        ];
        let kept = non_max_suppression(&boxes, 0.45);
        assert_eq!(kept, vec![boxes[1]]);
    }

    #[test]
    fn keeps_overlap_at_or_below_threshold() {
        let boxes = [
            boxed(0.0, 0.0, 10.0, 10.0, 0, 0.9),
            boxed(1.0, 1.0, 11.0, 11.0, 0, 0.8),
        ];
        let overlap = iou(&boxes[0], &boxes[1]);
        assert_eq!(non_max_suppression(&boxes, overlap).len(), 2);
        assert_eq!(non_max_suppression(&boxes, 0.9).len(), 2);
    }

    #[test]
    fn never_suppresses_across_classes() {
        let boxes = [
            boxed(0.0, 0.0, 10.0, 10.0, 3, 0.9),
            boxed(0.0, 0.0, 10.0, 10.0, 1, 0.5),
        ];
        let kept = non_max_suppression(&boxes, 0.0);
        assert_eq!(kept.len(), 2);
        // Grouped by ascending class id
        assert_eq!(kept[0].class_id, 1);
        assert_eq!(kept[1].class_id, 3);
    }

    #[test]
    fn greedy_order_matters() {
        // A overlaps B, B overlaps C, A does not overlap C: A and C survive.
        let boxes = [
            boxed(0.0, 0.0, 10.0, 10.0, 0, 0.9),
            boxed(5.0, 0.0, 15.0, 10.0, 0, 0.8),
            boxed(10.0, 0.0, 20.0, 10.0, 0, 0.7),
        ];
        let keep = nms_single_class(&boxes, 0.3);
        assert_eq!(keep, vec![0, 2]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let boxes = [
            boxed(0.0, 0.0, 10.0, 10.0, 0, 0.5),
            boxed(0.0, 0.0, 10.0, 10.0, 0, 0.5),
        ];
        assert_eq!(nms_single_class(&boxes, 0.5), vec![0]);
    }

    #[test]
    fn idempotent_on_own_output() {
        let boxes: Vec<Candidate> = (0..40)
            .map(|i| {
                let x = (i % 8) as f32 * 4.0;
                let y = (i / 8) as f32 * 3.0;
                boxed(x, y, x + 10.0, y + 8.0, i % 3, 1.0 - i as f32 / 100.0)
            })
            .collect();
        let once = non_max_suppression(&boxes, 0.45);
        let twice = non_max_suppression(&once, 0.45);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(non_max_suppression(&[], 0.45).is_empty());
    }
}
