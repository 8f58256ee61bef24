//! Candidate decoding: raw rows -> corner boxes with best class and combined score.

use crate::engine::{RawPrediction, BOX_FIELDS};

/// Decoded, not yet deduplicated box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: usize,
    pub score: f32,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

/// Convert center/size to corners, ordered so that `x1 <= x2` and `y1 <= y2`.
pub fn xywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> [f32; 4] {
    let (ax, bx) = (cx - w / 2.0, cx + w / 2.0);
    let (ay, by) = (cy - h / 2.0, cy + h / 2.0);
    [ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)]
}

/// Decode every row and keep the ones whose best `objectness * class_score` reaches `conf_thres`.
///
/// Ties in the class argmax go to the lowest class index.
pub fn decode_candidates(pred: &RawPrediction, conf_thres: f32) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(pred.num_candidates());

    for row in pred.rows() {
        let objectness = row[4];

        let mut class_id = 0;
        let mut score = f32::NEG_INFINITY;
        for (i, &class_score) in row[BOX_FIELDS..].iter().enumerate() {
            let combined = objectness * class_score;
            if combined > score {
                score = combined;
                class_id = i;
            }
        }

        if score.is_nan() || score < conf_thres {
            continue;
        }

        let [x1, y1, x2, y2] = xywh_to_xyxy(row[0], row[1], row[2], row[3]);
        candidates.push(Candidate {
            x1,
            y1,
            x2,
            y2,
            class_id,
            score,
        });
    }

    candidates
}
